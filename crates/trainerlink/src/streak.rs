//! Streaks and attendance rates.
//!
//! Everything here is computed from the set of days a student confirmed
//! attendance; nothing is stored separately.

use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Number of consecutive attended days ending today.
///
/// A streak that ended yesterday is still current: today has not finished,
/// so a student who has not checked in yet keeps their streak until the day
/// is over. Days after `today` are ignored.
#[must_use]
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let attended: BTreeSet<NaiveDate> = days.iter().copied().filter(|d| *d <= today).collect();

    let mut cursor = if attended.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };

    let mut streak = 0;
    while attended.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Length of the longest run of consecutive attended days.
#[must_use]
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    let attended: BTreeSet<NaiveDate> = days.iter().copied().collect();

    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for day in attended {
        run = match previous {
            Some(p) if day - p == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(day);
    }
    longest
}

/// Percentage of days in `from..=to` that were attended.
///
/// Returns 0 for an empty window.
#[must_use]
pub fn attendance_rate(days: &[NaiveDate], from: NaiveDate, to: NaiveDate) -> f64 {
    if to < from {
        return 0.0;
    }
    let attended = count_in_window(days, from, to);
    #[allow(clippy::cast_precision_loss)]
    let window = ((to - from).num_days() + 1) as f64;
    f64::from(attended) * 100.0 / window
}

fn count_in_window(days: &[NaiveDate], from: NaiveDate, to: NaiveDate) -> u32 {
    let distinct: BTreeSet<&NaiveDate> = days.iter().filter(|d| (from..=to).contains(*d)).collect();
    u32::try_from(distinct.len()).unwrap_or(u32::MAX)
}

/// Attendance figures for one student over a window of days ending today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    /// First day of the window.
    pub window_start: NaiveDate,
    /// Last day of the window (today).
    pub window_end: NaiveDate,
    /// Distinct days attended within the window.
    pub days_attended: u32,
    /// Current streak, counted within the window.
    pub current_streak: u32,
    /// Longest streak within the window.
    pub longest_streak: u32,
    /// Percentage of window days attended.
    pub rate_percent: f64,
}

impl AttendanceSummary {
    /// Summarize `days` over the `window_days` days ending on `today`.
    ///
    /// A window of zero days is treated as one day.
    #[must_use]
    pub fn from_days(days: &[NaiveDate], today: NaiveDate, window_days: u32) -> Self {
        let window_start = window_start(today, window_days);
        let in_window: Vec<NaiveDate> = days
            .iter()
            .copied()
            .filter(|d| (window_start..=today).contains(d))
            .collect();

        Self {
            window_start,
            window_end: today,
            days_attended: count_in_window(&in_window, window_start, today),
            current_streak: current_streak(&in_window, today),
            longest_streak: longest_streak(&in_window),
            rate_percent: attendance_rate(&in_window, window_start, today),
        }
    }
}

/// First day of a `window_days`-long window ending on `today`.
#[must_use]
pub fn window_start(today: NaiveDate, window_days: u32) -> NaiveDate {
    today - Duration::days(i64::from(window_days.max(1)) - 1)
}

//! Human-readable rendering of command results.
//!
//! Distances are kept unrounded everywhere else and only rounded here.

use std::fmt::Write;

use crate::attendance::{AttendanceRecord, ConfirmationOutcome, Readiness};
use crate::profile::{StudentProfile, TrainerProfile};
use crate::storage::StorageStats;
use crate::streak::AttendanceSummary;
use crate::tasks::{Task, TaskCategory, TaskList};

/// Format a distance in whole meters.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    format!("{meters:.0} m")
}

/// One-line description of a confirmation result.
#[must_use]
pub fn render_outcome(outcome: &ConfirmationOutcome) -> String {
    match outcome {
        ConfirmationOutcome::Confirmed(record) => format!(
            "Attendance confirmed for {} on {}{}",
            record.user_id,
            record.day,
            position_suffix(record)
        ),
        ConfirmationOutcome::AlreadyConfirmed(record) => format!(
            "Attendance already confirmed for {} on {} (at {} UTC)",
            record.user_id,
            record.day,
            record.confirmed_at.format("%H:%M")
        ),
        ConfirmationOutcome::Denied(reason) => format!("Attendance not confirmed: {reason}"),
    }
}

fn position_suffix(record: &AttendanceRecord) -> String {
    record
        .confirmed_at_position
        .map(|p| format!(" at {p}"))
        .unwrap_or_default()
}

/// One-line description of a readiness check.
#[must_use]
pub fn render_readiness(readiness: &Readiness) -> String {
    match readiness {
        Readiness::AlreadyConfirmed(record) => {
            format!("Already confirmed for {} on {}", record.user_id, record.day)
        }
        Readiness::Ready { distance_meters } => format!(
            "Ready: {} from the training location",
            format_distance(*distance_meters)
        ),
        Readiness::Blocked(reason) => format!("Cannot confirm: {reason}"),
    }
}

/// Trainer profile, one field per line.
#[must_use]
pub fn render_trainer(trainer: &TrainerProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trainer:   {} ({})", trainer.name, trainer.trainer_id);
    if let Some(sport) = &trainer.sport {
        let _ = writeln!(out, "Sport:     {sport}");
    }
    let _ = writeln!(out, "Location:  {}", trainer.fence.center);
    let _ = write!(
        out,
        "Radius:    {}",
        format_distance(trainer.fence.radius_meters)
    );
    out
}

/// Student profile, one field per line.
#[must_use]
pub fn render_student(student: &StudentProfile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Student:   {} ({})", student.name, student.student_id);
    if let Some(sport) = &student.sport {
        let _ = writeln!(out, "Sport:     {sport}");
    }
    let _ = write!(out, "Trainer:   {}", student.trainer_id);
    out
}

/// Attendance summary, one figure per line.
#[must_use]
pub fn render_summary(user_id: &str, summary: &AttendanceSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Attendance for {user_id}, {} to {}",
        summary.window_start, summary.window_end
    );
    let _ = writeln!(out, "  Days attended:   {}", summary.days_attended);
    let _ = writeln!(out, "  Current streak:  {}", day_count(summary.current_streak));
    let _ = writeln!(out, "  Longest streak:  {}", day_count(summary.longest_streak));
    let _ = write!(out, "  Attendance rate: {:.0}%", summary.rate_percent);
    out
}

fn day_count(days: u32) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

/// Confirmed days, oldest first.
#[must_use]
pub fn render_history(records: &[AttendanceRecord]) -> String {
    if records.is_empty() {
        return "No attendance recorded.".to_string();
    }
    records
        .iter()
        .map(|r| format!("{}  {} UTC", r.day, r.confirmed_at.format("%H:%M")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Task list grouped by category.
#[must_use]
pub fn render_tasks(list: &TaskList, only: Option<TaskCategory>) -> String {
    let categories = match only {
        Some(category) => vec![category],
        None => vec![TaskCategory::Exercise, TaskCategory::Practice],
    };

    let mut out = String::new();
    for category in categories {
        let tasks: Vec<&Task> = list.by_category(category).collect();
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "[{category}]");
        if tasks.is_empty() {
            let _ = writeln!(out, "  (none)");
        }
        for task in tasks {
            let mark = if task.completed { 'x' } else { ' ' };
            let _ = writeln!(out, "  [{mark}] {:>3}  {}", task.id, task.name);
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Database counters.
#[must_use]
pub fn render_stats(stats: &StorageStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Trainers:      {}", stats.trainers);
    let _ = writeln!(out, "Students:      {}", stats.students);
    let _ = writeln!(out, "Attendance:    {}", stats.attendance_records);
    let _ = write!(out, "Database size: {} bytes", stats.db_size_bytes);
    out
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::attendance::DenialReason;
    use crate::geo::{GeoFence, GeoPoint};
    use crate::location::LocationError;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_format_distance_rounds() {
        assert_eq!(format_distance(1111.95), "1112 m");
        assert_eq!(format_distance(0.0), "0 m");
    }

    #[test]
    fn test_render_outcome() {
        let record = AttendanceRecord::confirmed("u1", day(), GeoPoint::new(0.0, 0.0));
        assert_eq!(
            render_outcome(&ConfirmationOutcome::Confirmed(record.clone())),
            "Attendance confirmed for u1 on 2024-01-01 at (0.000000, 0.000000)"
        );
        assert!(render_outcome(&ConfirmationOutcome::AlreadyConfirmed(record))
            .starts_with("Attendance already confirmed for u1 on 2024-01-01"));

        let denied = ConfirmationOutcome::Denied(DenialReason::LocationUnavailable {
            cause: LocationError::PermissionDenied,
        });
        assert_eq!(
            render_outcome(&denied),
            "Attendance not confirmed: location unavailable: location permission denied"
        );
    }

    #[test]
    fn test_render_readiness() {
        assert_eq!(
            render_readiness(&Readiness::Ready {
                distance_meters: 3.4
            }),
            "Ready: 3 m from the training location"
        );
        assert_eq!(
            render_readiness(&Readiness::Blocked(DenialReason::NoGeofence)),
            "Cannot confirm: no training location registered"
        );
    }

    #[test]
    fn test_render_trainer() {
        let trainer = TrainerProfile::new(
            "TR100001",
            "Sam",
            Some("Tennis".to_string()),
            GeoFence::new(GeoPoint::new(1.5, 2.5), 75.0).unwrap(),
        )
        .unwrap();
        let text = render_trainer(&trainer);
        assert!(text.contains("Sam (TR100001)"));
        assert!(text.contains("Tennis"));
        assert!(text.ends_with("75 m"));
    }

    #[test]
    fn test_render_summary() {
        let summary = AttendanceSummary::from_days(&[day()], day(), 4);
        let text = render_summary("u1", &summary);
        assert!(text.contains("Current streak:  1 day"));
        assert!(text.contains("Longest streak:  1 day"));
        assert!(text.ends_with("25%"));
    }

    #[test]
    fn test_render_history_empty() {
        assert_eq!(render_history(&[]), "No attendance recorded.");
    }

    #[test]
    fn test_render_tasks() {
        let mut list = TaskList::new();
        list.add(TaskCategory::Exercise, "Sprints").unwrap();
        list.add(TaskCategory::Practice, "Juggling").unwrap();
        list.toggle(1).unwrap();

        let text = render_tasks(&list, None);
        assert!(text.starts_with("[exercise]"));
        assert!(text.contains("[x]   1  Sprints"));
        assert!(text.contains("[ ]   2  Juggling"));

        let practice_only = render_tasks(&list, Some(TaskCategory::Practice));
        assert!(!practice_only.contains("Sprints"));
    }
}

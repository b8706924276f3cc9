//! Attendance records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Whether a user attended on one calendar day.
///
/// There is at most one record per user per day. A record only comes into
/// existence when a confirmation succeeds, so stored records are normally
/// `confirmed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// The student who checked in.
    pub user_id: String,
    /// Calendar day in the user's local time zone.
    pub day: NaiveDate,
    /// Whether attendance was confirmed.
    pub confirmed: bool,
    /// Device position that satisfied the geofence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at_position: Option<GeoPoint>,
    /// When the record was created.
    pub confirmed_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Create a confirmed record stamped with the current time.
    #[must_use]
    pub fn confirmed(user_id: impl Into<String>, day: NaiveDate, position: GeoPoint) -> Self {
        Self {
            user_id: user_id.into(),
            day,
            confirmed: true,
            confirmed_at_position: Some(position),
            confirmed_at: Utc::now(),
        }
    }
}

//! Persistence interfaces.
//!
//! The attendance session depends on a [`ProfileStore`] rather than on a
//! concrete database, and task lists on a [`KeyValueStore`]. The `SQLite`
//! implementation of both lives in [`crate::storage`].

use chrono::NaiveDate;

use crate::attendance::AttendanceRecord;
use crate::error::Result;
use crate::geo::GeoFence;

/// Result of an atomic create-if-absent write.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The record was written.
    Created(AttendanceRecord),
    /// A record for the same user and day already existed; it is returned
    /// unchanged and nothing was written.
    AlreadyExists(AttendanceRecord),
}

impl CreateOutcome {
    /// The record that is now stored for the user and day.
    #[must_use]
    pub fn into_record(self) -> AttendanceRecord {
        match self {
            Self::Created(record) | Self::AlreadyExists(record) => record,
        }
    }
}

/// Read access to profiles and read/write access to attendance records.
///
/// Every call may cross the process boundary and may be cancelled by
/// dropping its future. `create_attendance_record` must be a single atomic
/// write keyed on `(user_id, day)`.
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Geofence registered by a trainer, if the trainer exists.
    async fn get_fence(&self, trainer_id: &str) -> Result<Option<GeoFence>>;

    /// Trainer a student is linked to, if the student exists.
    async fn trainer_for(&self, user_id: &str) -> Result<Option<String>>;

    /// Attendance record for a user on a day.
    async fn get_attendance_record(
        &self,
        user_id: &str,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>>;

    /// Create the record unless a confirmed one already exists for its user
    /// and day. An unconfirmed record is replaced.
    async fn create_attendance_record(&self, record: &AttendanceRecord) -> Result<CreateOutcome>;

    /// Records for a user with `since <= day <= until`, oldest first.
    async fn list_attendance_records(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>>;
}

/// Small per-user key-value storage for device-local state such as task
/// lists.
pub trait KeyValueStore {
    /// Value stored under `key` for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn get_value(&self, user_id: &str, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key` for `user_id`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn put_value(&self, user_id: &str, key: &str, value: &str) -> Result<()>;

    /// Remove `key` for `user_id`. Returns `true` if something was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn remove_value(&self, user_id: &str, key: &str) -> Result<bool>;
}

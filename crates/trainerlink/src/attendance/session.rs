//! The confirmation flow.

use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::{self, Evaluation, LocationReading};
use crate::location::{LocationError, LocationProvider, Permission};
use crate::store::{CreateOutcome, ProfileStore};
use crate::streak::{self, AttendanceSummary};

use super::AttendanceRecord;

/// How long a position request may take before it counts as unavailable.
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a confirmation was refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DenialReason {
    /// The device is outside the trainer's geofence.
    OutOfRange {
        /// Distance to the fence center in meters.
        distance_meters: f64,
    },
    /// No usable position could be obtained.
    LocationUnavailable {
        /// What went wrong.
        cause: LocationError,
    },
    /// The student has no trainer, or the trainer has no geofence.
    NoGeofence,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { distance_meters } => write!(
                f,
                "not at the training location ({distance_meters:.0} m away)"
            ),
            Self::LocationUnavailable { cause } => write!(f, "location unavailable: {cause}"),
            Self::NoGeofence => write!(f, "no training location registered"),
        }
    }
}

/// Result of a confirmation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ConfirmationOutcome {
    /// A new record was written.
    Confirmed(AttendanceRecord),
    /// Attendance was already confirmed today; this is the existing record.
    AlreadyConfirmed(AttendanceRecord),
    /// Nothing was written.
    Denied(DenialReason),
}

impl ConfirmationOutcome {
    /// The stored record, unless the request was denied.
    #[must_use]
    pub fn record(&self) -> Option<&AttendanceRecord> {
        match self {
            Self::Confirmed(record) | Self::AlreadyConfirmed(record) => Some(record),
            Self::Denied(_) => None,
        }
    }
}

/// Whether the confirmation control should be enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Readiness {
    /// Already confirmed today.
    AlreadyConfirmed(AttendanceRecord),
    /// In range; confirming now would succeed.
    Ready {
        /// Distance to the fence center in meters.
        distance_meters: f64,
    },
    /// Confirming now would be denied.
    Blocked(DenialReason),
}

impl Readiness {
    /// Whether confirming now would write a record.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Location check shared by `probe` and `request_confirmation`.
enum Assessment {
    InRange {
        reading: LocationReading,
        distance_meters: f64,
    },
    Blocked(DenialReason),
}

/// Confirms a student's attendance against their trainer's geofence.
///
/// The session holds no per-user state; everything it knows about a day
/// comes from the store, so it can be shared across users.
#[derive(Debug)]
pub struct AttendanceSession<L, S> {
    location: L,
    store: S,
    timeout: Duration,
    max_accuracy_meters: Option<f64>,
}

impl<L: LocationProvider, S: ProfileStore> AttendanceSession<L, S> {
    /// Create a session with the default timeout and no accuracy limit.
    pub fn new(location: L, store: S) -> Self {
        Self {
            location,
            store,
            timeout: DEFAULT_LOCATION_TIMEOUT,
            max_accuracy_meters: None,
        }
    }

    /// Bound position requests by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reject readings whose reported accuracy is worse than `limit_meters`.
    #[must_use]
    pub fn with_max_accuracy(mut self, limit_meters: Option<f64>) -> Self {
        self.max_accuracy_meters = limit_meters;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Try to confirm `user_id`'s attendance for `today`.
    ///
    /// Writes a record only when the device is inside the geofence and no
    /// record exists yet. Denials write nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the store fails, or
    /// [`Error::InvalidInput`] if the reading or stored fence is malformed.
    pub async fn request_confirmation(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<ConfirmationOutcome> {
        if let Some(existing) = self.existing_record(user_id, today).await? {
            info!("Attendance for {} on {} already confirmed", user_id, today);
            return Ok(ConfirmationOutcome::AlreadyConfirmed(existing));
        }

        let (reading, distance_meters) = match self.assess(user_id).await? {
            Assessment::InRange {
                reading,
                distance_meters,
            } => (reading, distance_meters),
            Assessment::Blocked(reason) => {
                info!("Attendance for {} on {} denied: {}", user_id, today, reason);
                return Ok(ConfirmationOutcome::Denied(reason));
            }
        };

        let record = AttendanceRecord::confirmed(user_id, today, reading.position);
        let outcome = self
            .store
            .create_attendance_record(&record)
            .await
            .map_err(Error::store_unavailable)?;

        match outcome {
            CreateOutcome::Created(record) => {
                info!(
                    "Attendance for {} on {} confirmed at {:.1} m from center",
                    user_id, today, distance_meters
                );
                Ok(ConfirmationOutcome::Confirmed(record))
            }
            CreateOutcome::AlreadyExists(existing) => {
                info!(
                    "Attendance for {} on {} was confirmed concurrently",
                    user_id, today
                );
                Ok(ConfirmationOutcome::AlreadyConfirmed(existing))
            }
        }
    }

    /// Report whether confirming now would succeed, without writing anything.
    ///
    /// # Errors
    ///
    /// Same as [`Self::request_confirmation`].
    pub async fn probe(&self, user_id: &str, today: NaiveDate) -> Result<Readiness> {
        if let Some(existing) = self.existing_record(user_id, today).await? {
            return Ok(Readiness::AlreadyConfirmed(existing));
        }

        let readiness = match self.assess(user_id).await? {
            Assessment::InRange {
                distance_meters, ..
            } => Readiness::Ready { distance_meters },
            Assessment::Blocked(reason) => Readiness::Blocked(reason),
        };
        debug!("Readiness for {} on {}: {:?}", user_id, today, readiness);
        Ok(readiness)
    }

    /// Confirmed records for `user_id` between `since` and `until` inclusive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the store fails.
    pub async fn history(
        &self,
        user_id: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let records = self
            .store
            .list_attendance_records(user_id, since, until)
            .await
            .map_err(Error::store_unavailable)?;
        Ok(records.into_iter().filter(|r| r.confirmed).collect())
    }

    /// Streaks and attendance rate over the `window_days` days ending `today`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreUnavailable`] if the store fails.
    pub async fn summary(
        &self,
        user_id: &str,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<AttendanceSummary> {
        let since = streak::window_start(today, window_days);
        let days: Vec<NaiveDate> = self
            .history(user_id, since, today)
            .await?
            .into_iter()
            .map(|r| r.day)
            .collect();
        Ok(AttendanceSummary::from_days(&days, today, window_days))
    }

    async fn existing_record(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let record = self
            .store
            .get_attendance_record(user_id, today)
            .await
            .map_err(Error::store_unavailable)?;
        Ok(record.filter(|r| r.confirmed))
    }

    async fn assess(&self, user_id: &str) -> Result<Assessment> {
        let reading = match self.locate().await {
            Ok(reading) => reading,
            Err(cause) => {
                warn!("No usable location for {}: {}", user_id, cause);
                return Ok(Assessment::Blocked(DenialReason::LocationUnavailable {
                    cause,
                }));
            }
        };

        let Some(trainer_id) = self
            .store
            .trainer_for(user_id)
            .await
            .map_err(Error::store_unavailable)?
        else {
            debug!("{} is not linked to a trainer", user_id);
            return Ok(Assessment::Blocked(DenialReason::NoGeofence));
        };

        let Some(fence) = self
            .store
            .get_fence(&trainer_id)
            .await
            .map_err(Error::store_unavailable)?
        else {
            debug!("Trainer {} has no geofence", trainer_id);
            return Ok(Assessment::Blocked(DenialReason::NoGeofence));
        };

        match geo::evaluate(&reading, &fence)? {
            Evaluation::InRange { distance_meters } => Ok(Assessment::InRange {
                reading,
                distance_meters,
            }),
            Evaluation::OutOfRange { distance_meters } => {
                Ok(Assessment::Blocked(DenialReason::OutOfRange {
                    distance_meters,
                }))
            }
        }
    }

    /// Ask for permission, then for a fix. Both steps together are bounded by
    /// the configured timeout.
    async fn locate(&self) -> std::result::Result<LocationReading, LocationError> {
        let reading = tokio::time::timeout(self.timeout, self.permitted_fix())
            .await
            .map_err(|_| LocationError::Timeout)??;

        if let (Some(limit_meters), Some(accuracy_meters)) =
            (self.max_accuracy_meters, reading.accuracy_meters)
        {
            if accuracy_meters > limit_meters {
                return Err(LocationError::InsufficientAccuracy {
                    accuracy_meters,
                    limit_meters,
                });
            }
        }

        Ok(reading)
    }

    async fn permitted_fix(&self) -> std::result::Result<LocationReading, LocationError> {
        if self.location.request_permission().await == Permission::Denied {
            return Err(LocationError::PermissionDenied);
        }
        self.location.current_position().await
    }
}

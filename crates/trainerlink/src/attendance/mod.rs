//! Daily attendance confirmation.
//!
//! A student confirms attendance at most once per calendar day, and only
//! while their device is inside their trainer's geofence.

mod record;
mod session;

pub use record::AttendanceRecord;
pub use session::{
    AttendanceSession, ConfirmationOutcome, DenialReason, Readiness, DEFAULT_LOCATION_TIMEOUT,
};

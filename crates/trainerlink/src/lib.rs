//! `trainerlink` - Attendance tracking for trainers and their students
//!
//! Trainers register the place they train at as a geofence. Students confirm
//! attendance once per day, and only while their device is inside that fence.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod attendance;
pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod location;
pub mod logging;
pub mod profile;
pub mod storage;
pub mod store;
pub mod streak;
pub mod tasks;

pub use attendance::{
    AttendanceRecord, AttendanceSession, ConfirmationOutcome, DenialReason, Readiness,
};
pub use config::Config;
pub use error::{Error, Result};
pub use geo::{evaluate, Evaluation, GeoFence, GeoPoint, LocationReading};
pub use location::{LocationError, LocationProvider, Permission};
pub use logging::init_logging;
pub use profile::{StudentProfile, TrainerProfile};
pub use storage::{Storage, StorageStats};
pub use store::{CreateOutcome, KeyValueStore, ProfileStore};

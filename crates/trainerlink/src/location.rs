//! Location provider abstraction.
//!
//! The attendance session never talks to GPS hardware directly. It asks a
//! [`LocationProvider`] for permission and a fresh fix, and treats every
//! failure as "location unavailable".

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::geo::LocationReading;

/// Reasons a location fix could not be obtained.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationError {
    /// The user did not grant location permission.
    #[error("location permission denied")]
    PermissionDenied,

    /// Location services are switched off on the device.
    #[error("location services are disabled")]
    ServicesDisabled,

    /// The provider did not answer in time.
    #[error("location request timed out")]
    Timeout,

    /// The fix was too imprecise to decide attendance.
    #[error("location accuracy {accuracy_meters:.0} m exceeds the {limit_meters:.0} m limit")]
    InsufficientAccuracy {
        /// Accuracy reported by the provider.
        accuracy_meters: f64,
        /// Configured upper bound.
        limit_meters: f64,
    },

    /// Any other provider failure.
    #[error("location provider failed: {message}")]
    Failed {
        /// Provider-specific description.
        message: String,
    },
}

/// Answer to a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Location access is allowed.
    Granted,
    /// Location access was refused.
    Denied,
}

/// A source of device positions.
///
/// Both calls may leave the process (OS services, a remote device) and are
/// cancelled by dropping the returned future.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for permission to read the device location.
    async fn request_permission(&self) -> Permission;

    /// Obtain a fresh fix.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] describing why no position is available.
    async fn current_position(&self) -> Result<LocationReading, LocationError>;
}

#[async_trait::async_trait]
impl<T: LocationProvider + ?Sized> LocationProvider for Box<T> {
    async fn request_permission(&self) -> Permission {
        (**self).request_permission().await
    }

    async fn current_position(&self) -> Result<LocationReading, LocationError> {
        (**self).current_position().await
    }
}

/// A provider that always reports the same reading.
///
/// Used by the command-line front end, where the caller supplies the device
/// coordinates explicitly.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    reading: LocationReading,
}

impl FixedLocationProvider {
    /// Create a provider that returns `reading` on every request.
    #[must_use]
    pub fn new(reading: LocationReading) -> Self {
        Self { reading }
    }
}

#[async_trait::async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn current_position(&self) -> Result<LocationReading, LocationError> {
        debug!("Returning fixed position {}", self.reading.position);
        Ok(self.reading)
    }
}

/// A provider whose permission is never granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedLocationProvider;

#[async_trait::async_trait]
impl LocationProvider for DeniedLocationProvider {
    async fn request_permission(&self) -> Permission {
        Permission::Denied
    }

    async fn current_position(&self) -> Result<LocationReading, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    #[tokio::test]
    async fn test_fixed_provider_returns_reading() {
        let reading = LocationReading::now(GeoPoint::new(12.0, 34.0));
        let provider = FixedLocationProvider::new(reading);

        assert_eq!(provider.request_permission().await, Permission::Granted);
        assert_eq!(provider.current_position().await.unwrap(), reading);
    }

    #[tokio::test]
    async fn test_denied_provider() {
        let provider = DeniedLocationProvider;
        assert_eq!(provider.request_permission().await, Permission::Denied);
        assert_eq!(
            provider.current_position().await.unwrap_err(),
            LocationError::PermissionDenied
        );
    }

    #[test]
    fn test_location_error_display() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "location permission denied"
        );
        let err = LocationError::InsufficientAccuracy {
            accuracy_meters: 250.0,
            limit_meters: 50.0,
        };
        assert_eq!(
            err.to_string(),
            "location accuracy 250 m exceeds the 50 m limit"
        );
    }

    #[test]
    fn test_location_error_serialization() {
        let json = serde_json::to_string(&LocationError::Timeout).unwrap();
        assert_eq!(json, r#"{"kind":"timeout"}"#);
    }
}

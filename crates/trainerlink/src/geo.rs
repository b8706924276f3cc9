//! Geofence evaluation.
//!
//! A geofence is a circle on the earth's surface: a center coordinate and a
//! radius in meters. [`evaluate`] decides whether a location reading falls
//! inside one, using the haversine great-circle distance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean earth radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, within [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, within [-180, 180].
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point without validating it.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both coordinates are finite and within range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the offending coordinate.
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(Error::invalid_input(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(Error::invalid_input(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A circular boundary around a trainer's training location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFence {
    /// Center of the circle.
    pub center: GeoPoint,
    /// Radius in meters; always strictly positive.
    pub radius_meters: f64,
}

impl GeoFence {
    /// Create a validated geofence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the center is out of range or the
    /// radius is not a finite positive number.
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self> {
        let fence = Self {
            center,
            radius_meters,
        };
        fence.validate()?;
        Ok(fence)
    }

    /// Parse a geofence from the free-text fields of a registration form.
    ///
    /// All three fields are mandatory; surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a field is empty, not a number, or
    /// the resulting fence is invalid.
    pub fn from_form(latitude: &str, longitude: &str, radius: &str) -> Result<Self> {
        let latitude = parse_field("latitude", latitude)?;
        let longitude = parse_field("longitude", longitude)?;
        let radius = parse_field("radius", radius)?;
        Self::new(GeoPoint::new(latitude, longitude), radius)
    }

    /// Check the center coordinates and the radius.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] on the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.center.validate()?;
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(Error::invalid_input(format!(
                "radius {} must be a positive number of meters",
                self.radius_meters
            )));
        }
        Ok(())
    }
}

fn parse_field(name: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_input(format!("{name} is required")));
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| Error::invalid_input(format!("{name} '{trimmed}' is not a number")))
}

/// A device position as reported by a location provider.
///
/// Readings are ephemeral: they are produced fresh for each evaluation and
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    /// Where the device is.
    pub position: GeoPoint,
    /// When the fix was obtained.
    pub obtained_at: DateTime<Utc>,
    /// Horizontal accuracy radius reported by the provider, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy_meters: Option<f64>,
}

impl LocationReading {
    /// Create a reading obtained now.
    #[must_use]
    pub fn now(position: GeoPoint) -> Self {
        Self {
            position,
            obtained_at: Utc::now(),
            accuracy_meters: None,
        }
    }

    /// Attach a reported accuracy.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy_meters: f64) -> Self {
        self.accuracy_meters = Some(accuracy_meters);
        self
    }
}

/// Outcome of checking a reading against a geofence.
///
/// The distance is carried unrounded in both cases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Evaluation {
    /// The reading is inside the fence (or exactly on its boundary).
    InRange {
        /// Distance to the fence center in meters.
        distance_meters: f64,
    },
    /// The reading is outside the fence.
    OutOfRange {
        /// Distance to the fence center in meters.
        distance_meters: f64,
    },
}

impl Evaluation {
    /// Whether the reading was inside the fence.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        matches!(self, Self::InRange { .. })
    }

    /// Distance to the fence center in meters.
    #[must_use]
    pub fn distance_meters(&self) -> f64 {
        match self {
            Self::InRange { distance_meters } | Self::OutOfRange { distance_meters } => {
                *distance_meters
            }
        }
    }
}

/// Haversine great-circle distance between two points, in meters.
#[must_use]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = ((d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Decide whether `reading` lies within `fence`.
///
/// The boundary counts as in range.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the reading position or the fence is
/// malformed.
pub fn evaluate(reading: &LocationReading, fence: &GeoFence) -> Result<Evaluation> {
    reading.position.validate()?;
    fence.validate()?;

    let distance_meters = distance_meters(reading.position, fence.center);
    if distance_meters <= fence.radius_meters {
        Ok(Evaluation::InRange { distance_meters })
    } else {
        Ok(Evaluation::OutOfRange { distance_meters })
    }
}

//! Trainer and student profiles.
//!
//! Only the parts of a profile that attendance depends on are modelled here:
//! the trainer's geofence and the student's link to a trainer.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::GeoFence;

/// Prefix of generated trainer codes.
const TRAINER_ID_PREFIX: &str = "TR";

/// A trainer and the training location students check in at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerProfile {
    /// Trainer code students use to link to this trainer (e.g. `TR482913`).
    pub trainer_id: String,
    /// Display name.
    pub name: String,
    /// Sport coached, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    /// Training location.
    pub fence: GeoFence,
}

impl TrainerProfile {
    /// Create a validated trainer profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the id or name is blank or the fence
    /// is malformed.
    pub fn new(
        trainer_id: impl Into<String>,
        name: impl Into<String>,
        sport: Option<String>,
        fence: GeoFence,
    ) -> Result<Self> {
        let profile = Self {
            trainer_id: trainer_id.into().trim().to_string(),
            name: name.into().trim().to_string(),
            sport: sport
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            fence,
        };
        require("trainer id", &profile.trainer_id)?;
        require("trainer name", &profile.name)?;
        profile.fence.validate()?;
        Ok(profile)
    }

    /// Derive a six-digit trainer code from the trainer's name and a seed.
    ///
    /// The seed is typically the registration timestamp; the same inputs
    /// always yield the same code.
    #[must_use]
    pub fn generate_id(name: &str, seed: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(name.trim().as_bytes());
        hasher.update(&seed.to_le_bytes());
        let digest = hasher.finalize();

        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.as_bytes()[..8]);
        let number = 100_000 + u64::from_le_bytes(prefix) % 900_000;
        format!("{TRAINER_ID_PREFIX}{number}")
    }
}

/// A student linked to a trainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    /// Student identifier.
    pub student_id: String,
    /// Display name.
    pub name: String,
    /// Trainer code of the student's trainer.
    pub trainer_id: String,
    /// Sport practiced, if given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
}

impl StudentProfile {
    /// Create a validated student profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any mandatory field is blank.
    pub fn new(
        student_id: impl Into<String>,
        name: impl Into<String>,
        trainer_id: impl Into<String>,
        sport: Option<String>,
    ) -> Result<Self> {
        let profile = Self {
            student_id: student_id.into().trim().to_string(),
            name: name.into().trim().to_string(),
            trainer_id: trainer_id.into().trim().to_string(),
            sport: sport
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        };
        require("student id", &profile.student_id)?;
        require("student name", &profile.name)?;
        require("trainer id", &profile.trainer_id)?;
        Ok(profile)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::invalid_input(format!("{field} is required")))
    } else {
        Ok(())
    }
}

//! Error types for trainerlink.
//!
//! This module defines all error types used throughout the trainerlink crate.
//! The first group mirrors the failure kinds an attendance check can report to
//! the presentation layer; the rest cover storage, configuration and I/O.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for trainerlink operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Attendance Errors ===
    /// Malformed coordinates, a non-positive radius, or other bad input.
    ///
    /// Not user-recoverable; callers should validate before calling in.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong.
        message: String,
    },

    /// The profile store could not be reached or failed mid-operation.
    #[error("profile store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the underlying failure.
        message: String,
    },

    /// A profile or record that must exist was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was being looked up (e.g. "trainer").
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for trainerlink operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a not-found error for the given kind of entity.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Fold any error coming out of a profile store into `StoreUnavailable`.
    ///
    /// Input errors pass through untouched so that a bad coordinate stored in
    /// a profile is still reported as such.
    #[must_use]
    pub fn store_unavailable(err: Self) -> Self {
        match err {
            e @ (Self::StoreUnavailable { .. } | Self::InvalidInput { .. }) => e,
            other => Self::StoreUnavailable {
                message: other.to_string(),
            },
        }
    }

    /// Check if this error is an input validation failure.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Check if this error is a store failure.
    #[must_use]
    pub fn is_store_unavailable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::DatabaseOpen { .. } | Self::DatabaseQuery(_)
        )
    }

    /// Check if the user can sensibly retry the action that produced this error.
    #[must_use]
    pub fn is_user_recoverable(&self) -> bool {
        self.is_store_unavailable() || matches!(self, Self::Io(_))
    }
}

//! Configuration management for trainerlink.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "trainerlink";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "trainerlink.db";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "TRAINERLINK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TRAINERLINK_`, sections separated
///    by `__`, e.g. `TRAINERLINK_LOCATION__TIMEOUT_MS`)
/// 2. TOML config file at `~/.config/trainerlink/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Location configuration.
    pub location: LocationConfig,
    /// Attendance configuration.
    pub attendance: AttendanceConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/trainerlink/trainerlink.db`
    pub database_path: Option<PathBuf>,
}

/// Location-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// How long to wait for a position fix, in milliseconds.
    pub timeout_ms: u64,
    /// Reject fixes whose reported accuracy radius exceeds this many meters.
    /// Unset accepts any accuracy.
    pub max_accuracy_meters: Option<f64>,
}

/// Attendance-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Number of days covered by history and summaries.
    pub history_days: u32,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_accuracy_meters: None,
        }
    }
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self { history_days: 30 }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &std::path::Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.location.timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "location.timeout_ms must be greater than 0".to_string(),
            });
        }

        if let Some(limit) = self.location.max_accuracy_meters {
            if !limit.is_finite() || limit <= 0.0 {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "location.max_accuracy_meters must be a positive number, got {limit}"
                    ),
                });
            }
        }

        if self.attendance.history_days == 0 {
            return Err(Error::ConfigValidation {
                message: "attendance.history_days must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the location timeout as a Duration.
    #[must_use]
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.location.timeout_ms, 10_000);
        assert!(config.location.max_accuracy_meters.is_none());
        assert_eq!(config.attendance.history_days, 30);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.location.timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeout_ms"));
    }

    #[test]
    fn test_validate_accuracy_limit() {
        let mut config = Config::default();

        config.location.max_accuracy_meters = Some(0.0);
        assert!(config.validate().is_err());

        config.location.max_accuracy_meters = Some(f64::NAN);
        assert!(config.validate().is_err());

        config.location.max_accuracy_meters = Some(25.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_history_days() {
        let mut config = Config::default();
        config.attendance.history_days = 0;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(err.to_string().contains("history_days"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        let path = config.database_path();

        assert!(path.to_string_lossy().contains("trainerlink.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_location_timeout() {
        let config = Config::default();
        assert_eq!(config.location_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("trainerlink"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        figment::Jail::expect_with(|_jail| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "trainerlink.toml",
                r#"
                [location]
                timeout_ms = 2500
                max_accuracy_meters = 40.0

                [attendance]
                history_days = 14
                "#,
            )?;
            jail.set_env("TRAINERLINK_ATTENDANCE__HISTORY_DAYS", "7");

            let config = Config::load_from(Some(PathBuf::from("trainerlink.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.location.timeout_ms, 2500);
            assert_eq!(config.location.max_accuracy_meters, Some(40.0));
            assert_eq!(config.attendance.history_days, 7);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("trainerlink.toml", "[location]\ntimeout_ms = 0\n")?;

            let result = Config::load_from(Some(PathBuf::from("trainerlink.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("timeout_ms"));
        assert!(json.contains("history_days"));
    }

    #[test]
    fn test_location_config_deserialize() {
        let json = r#"{"timeout_ms": 3000}"#;
        let location: LocationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(location.timeout_ms, 3000);
        assert!(location.max_accuracy_meters.is_none());
    }
}

//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::geo::{GeoPoint, LocationReading};
use crate::location::{DeniedLocationProvider, FixedLocationProvider, LocationProvider};
use crate::tasks::TaskCategory;

/// Trainer management commands.
#[derive(Debug, Subcommand)]
pub enum TrainerCommand {
    /// Register a trainer and their training location
    Register {
        /// Trainer's name
        #[arg(short, long)]
        name: String,

        /// Sport coached
        #[arg(short, long)]
        sport: Option<String>,

        #[command(flatten)]
        fence: FenceArgs,

        /// Use this trainer code instead of generating one
        #[arg(long, value_name = "TRAINER_ID")]
        id: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a trainer profile
    Show {
        /// Trainer code
        trainer_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Move or resize a trainer's training location
    SetFence {
        /// Trainer code
        trainer_id: String,

        #[command(flatten)]
        fence: FenceArgs,
    },

    /// List the students linked to a trainer
    Roster {
        /// Trainer code
        trainer_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Student management commands.
#[derive(Debug, Subcommand)]
pub enum StudentCommand {
    /// Register a student under a trainer
    Register {
        /// Student identifier
        student_id: String,

        /// Student's name
        #[arg(short, long)]
        name: String,

        /// Trainer code to link to
        #[arg(short, long, value_name = "TRAINER_ID")]
        trainer: String,

        /// Sport practiced
        #[arg(short, long)]
        sport: Option<String>,
    },

    /// Show a student profile
    Show {
        /// Student identifier
        student_id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Attendance commands.
#[derive(Debug, Subcommand)]
pub enum AttendanceCommand {
    /// Confirm today's attendance from the given position
    Confirm {
        /// Student identifier
        user_id: String,

        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        day: DayArgs,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check whether attendance could be confirmed, without recording it
    Check {
        /// Student identifier
        user_id: String,

        #[command(flatten)]
        location: LocationArgs,

        #[command(flatten)]
        day: DayArgs,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List confirmed days
    History {
        /// Student identifier
        user_id: String,

        #[command(flatten)]
        day: DayArgs,

        /// Number of days to look back (defaults to attendance.history_days)
        #[arg(long)]
        days: Option<u32>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show streaks and attendance rate
    Summary {
        /// Student identifier
        user_id: String,

        #[command(flatten)]
        day: DayArgs,

        /// Number of days to summarize (defaults to attendance.history_days)
        #[arg(long)]
        days: Option<u32>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Task list commands.
#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a task to a student's list
    Add {
        /// Student identifier
        user_id: String,

        /// What to do
        name: String,

        /// Which list the task goes on
        #[arg(long, value_enum, default_value = "exercise")]
        category: TaskCategoryArg,
    },

    /// Show a student's tasks
    List {
        /// Student identifier
        user_id: String,

        /// Only show one list
        #[arg(long, value_enum)]
        category: Option<TaskCategoryArg>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Mark a task done, or not done
    Toggle {
        /// Student identifier
        user_id: String,

        /// Task id
        id: u32,
    },

    /// Delete a task
    Remove {
        /// Student identifier
        user_id: String,

        /// Task id
        id: u32,
    },
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Training location, as entered on the registration form.
///
/// Values stay text until [`crate::geo::GeoFence::from_form`] parses them,
/// so a bad entry is reported with the field it came from.
#[derive(Debug, Clone, Args)]
pub struct FenceArgs {
    /// Latitude of the training location in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: String,

    /// Longitude of the training location in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: String,

    /// Check-in radius in meters
    #[arg(short, long)]
    pub radius: String,
}

/// Device position for attendance commands.
///
/// Without coordinates the device is treated as having refused location
/// access.
#[derive(Debug, Clone, Default, Args)]
pub struct LocationArgs {
    /// Device latitude in degrees
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Device longitude in degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Accuracy radius reported by the device, in meters
    #[arg(long, requires = "lat")]
    pub accuracy: Option<f64>,
}

impl LocationArgs {
    /// The reading described by the arguments, if coordinates were given.
    #[must_use]
    pub fn reading(&self) -> Option<LocationReading> {
        let reading = LocationReading::now(GeoPoint::new(self.lat?, self.lon?));
        Some(match self.accuracy {
            Some(accuracy) => reading.with_accuracy(accuracy),
            None => reading,
        })
    }

    /// A location provider answering with the given position.
    #[must_use]
    pub fn provider(&self) -> Box<dyn LocationProvider> {
        match self.reading() {
            Some(reading) => Box::new(FixedLocationProvider::new(reading)),
            None => Box::new(DeniedLocationProvider),
        }
    }
}

/// Which calendar day a command applies to.
#[derive(Debug, Clone, Default, Args)]
pub struct DayArgs {
    /// Day to use instead of today (local time)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

impl DayArgs {
    /// The requested day, or today in the local time zone.
    #[must_use]
    pub fn resolve(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Task category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TaskCategoryArg {
    /// Assigned exercises
    Exercise,
    /// Self-directed practice
    Practice,
}

impl From<TaskCategoryArg> for TaskCategory {
    fn from(arg: TaskCategoryArg) -> Self {
        match arg {
            TaskCategoryArg::Exercise => Self::Exercise,
            TaskCategoryArg::Practice => Self::Practice,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_category_arg_conversion() {
        assert_eq!(
            TaskCategory::from(TaskCategoryArg::Exercise),
            TaskCategory::Exercise
        );
        assert_eq!(
            TaskCategory::from(TaskCategoryArg::Practice),
            TaskCategory::Practice
        );
    }

    #[test]
    fn test_location_args_without_coordinates() {
        assert!(LocationArgs::default().reading().is_none());
    }

    #[test]
    fn test_location_args_reading() {
        let args = LocationArgs {
            lat: Some(34.0549),
            lon: Some(-118.2426),
            accuracy: Some(12.0),
        };
        let reading = args.reading().unwrap();
        assert_eq!(reading.position, GeoPoint::new(34.0549, -118.2426));
        assert_eq!(reading.accuracy_meters, Some(12.0));
    }

    #[tokio::test]
    async fn test_location_args_provider() {
        let denied = LocationArgs::default().provider();
        assert!(denied.current_position().await.is_err());

        let fixed = LocationArgs {
            lat: Some(1.0),
            lon: Some(2.0),
            accuracy: None,
        }
        .provider();
        let reading = fixed.current_position().await.unwrap();
        assert_eq!(reading.position, GeoPoint::new(1.0, 2.0));
    }

    #[test]
    fn test_day_args_resolve() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let args = DayArgs { date: Some(day) };
        assert_eq!(args.resolve(), day);
    }
}

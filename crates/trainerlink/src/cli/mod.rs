//! Command-line interface for trainerlink.
//!
//! This module provides the CLI structure and output rendering for the
//! `trainerlink` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AttendanceCommand, ConfigCommand, DayArgs, FenceArgs, LocationArgs, StatusCommand,
    StudentCommand, TaskCategoryArg, TaskCommand, TrainerCommand,
};

/// trainerlink - Attendance tracking for trainers and their students
///
/// Trainers register a training location; students confirm attendance once
/// a day while they are there.
#[derive(Debug, Parser)]
#[command(name = "trainerlink")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage trainers and their training locations
    #[command(subcommand)]
    Trainer(TrainerCommand),

    /// Manage students
    #[command(subcommand)]
    Student(StudentCommand),

    /// Confirm and review attendance
    #[command(subcommand)]
    Attendance(AttendanceCommand),

    /// Manage a student's exercise and practice tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

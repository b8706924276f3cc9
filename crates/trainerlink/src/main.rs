//! `trainerlink` - CLI for trainer/student attendance tracking
//!
//! This binary registers trainers and students, confirms attendance against
//! a trainer's geofence and manages students' task lists.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use trainerlink::cli::output;
use trainerlink::cli::{
    AttendanceCommand, Cli, Command, ConfigCommand, FenceArgs, StudentCommand, TaskCommand,
    TrainerCommand,
};
use trainerlink::location::{DeniedLocationProvider, LocationProvider};
use trainerlink::tasks::TaskList;
use trainerlink::{
    init_logging, AttendanceSession, Config, ConfirmationOutcome, Error, GeoFence, Storage,
    StudentProfile, TrainerProfile,
};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd).map(|()| ExitCode::SUCCESS),
        Command::Status(cmd) => handle_status(&config, cmd.json).map(|()| ExitCode::SUCCESS),
        Command::Trainer(cmd) => {
            handle_trainer(&open_storage(&config)?, cmd).map(|()| ExitCode::SUCCESS)
        }
        Command::Student(cmd) => {
            handle_student(&open_storage(&config)?, cmd).map(|()| ExitCode::SUCCESS)
        }
        Command::Task(cmd) => handle_task(&open_storage(&config)?, cmd).map(|()| ExitCode::SUCCESS),
        Command::Attendance(cmd) => handle_attendance(&config, open_storage(&config)?, cmd).await,
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fence_from_args(args: &FenceArgs) -> Result<GeoFence> {
    Ok(GeoFence::from_form(&args.lat, &args.lon, &args.radius)?)
}

fn handle_trainer(storage: &Storage, cmd: TrainerCommand) -> Result<()> {
    match cmd {
        TrainerCommand::Register {
            name,
            sport,
            fence,
            id,
            json,
        } => {
            let fence = fence_from_args(&fence)?;
            let seed = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
            let trainer_id = id.unwrap_or_else(|| TrainerProfile::generate_id(&name, seed));
            let trainer = TrainerProfile::new(trainer_id, name, sport, fence)?;
            storage.register_trainer(&trainer)?;

            if json {
                print_json(&trainer)?;
            } else {
                println!("{}", output::render_trainer(&trainer));
                println!();
                println!(
                    "Students link to you with the trainer code {}",
                    trainer.trainer_id
                );
            }
        }
        TrainerCommand::Show { trainer_id, json } => {
            let trainer = storage
                .get_trainer(&trainer_id)?
                .ok_or_else(|| Error::not_found("trainer", trainer_id))?;
            if json {
                print_json(&trainer)?;
            } else {
                println!("{}", output::render_trainer(&trainer));
            }
        }
        TrainerCommand::SetFence { trainer_id, fence } => {
            let fence = fence_from_args(&fence)?;
            storage.update_fence(&trainer_id, &fence)?;
            println!(
                "Training location for {trainer_id} set to {} within {}",
                fence.center,
                output::format_distance(fence.radius_meters)
            );
        }
        TrainerCommand::Roster { trainer_id, json } => {
            if storage.get_trainer(&trainer_id)?.is_none() {
                return Err(Error::not_found("trainer", trainer_id).into());
            }
            let students = storage.roster(&trainer_id)?;
            if json {
                print_json(&students)?;
            } else if students.is_empty() {
                println!("No students linked to {trainer_id}.");
            } else {
                for student in students {
                    println!("{:<16} {}", student.student_id, student.name);
                }
            }
        }
    }
    Ok(())
}

fn handle_student(storage: &Storage, cmd: StudentCommand) -> Result<()> {
    match cmd {
        StudentCommand::Register {
            student_id,
            name,
            trainer,
            sport,
        } => {
            let student = StudentProfile::new(student_id, name, trainer, sport)?;
            storage.register_student(&student)?;
            println!(
                "Registered {} with trainer {}",
                student.student_id, student.trainer_id
            );
        }
        StudentCommand::Show { student_id, json } => {
            let student = storage
                .get_student(&student_id)?
                .ok_or_else(|| Error::not_found("student", student_id))?;
            if json {
                print_json(&student)?;
            } else {
                println!("{}", output::render_student(&student));
            }
        }
    }
    Ok(())
}

fn session(
    config: &Config,
    location: Box<dyn LocationProvider>,
    storage: Storage,
) -> AttendanceSession<Box<dyn LocationProvider>, Storage> {
    AttendanceSession::new(location, storage)
        .with_timeout(config.location_timeout())
        .with_max_accuracy(config.location.max_accuracy_meters)
}

async fn handle_attendance(
    config: &Config,
    storage: Storage,
    cmd: AttendanceCommand,
) -> Result<ExitCode> {
    match cmd {
        AttendanceCommand::Confirm {
            user_id,
            location,
            day,
            json,
        } => {
            let session = session(config, location.provider(), storage);
            let outcome = session.request_confirmation(&user_id, day.resolve()).await?;
            if json {
                print_json(&outcome)?;
            } else {
                println!("{}", output::render_outcome(&outcome));
            }
            if matches!(outcome, ConfirmationOutcome::Denied(_)) {
                return Ok(ExitCode::FAILURE);
            }
        }
        AttendanceCommand::Check {
            user_id,
            location,
            day,
            json,
        } => {
            let session = session(config, location.provider(), storage);
            let readiness = session.probe(&user_id, day.resolve()).await?;
            if json {
                print_json(&readiness)?;
            } else {
                println!("{}", output::render_readiness(&readiness));
            }
        }
        AttendanceCommand::History {
            user_id,
            day,
            days,
            json,
        } => {
            let today = day.resolve();
            let window = days.unwrap_or(config.attendance.history_days);
            let since = trainerlink::streak::window_start(today, window);
            let session = session(config, Box::new(DeniedLocationProvider), storage);
            let records = session.history(&user_id, since, today).await?;
            if json {
                print_json(&records)?;
            } else {
                println!("{}", output::render_history(&records));
            }
        }
        AttendanceCommand::Summary {
            user_id,
            day,
            days,
            json,
        } => {
            let window = days.unwrap_or(config.attendance.history_days);
            let session = session(config, Box::new(DeniedLocationProvider), storage);
            let summary = session.summary(&user_id, day.resolve(), window).await?;
            if json {
                print_json(&summary)?;
            } else {
                println!("{}", output::render_summary(&user_id, &summary));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_task(storage: &Storage, cmd: TaskCommand) -> Result<()> {
    match cmd {
        TaskCommand::Add {
            user_id,
            name,
            category,
        } => {
            let mut list = TaskList::load(storage, &user_id)?;
            let task = list.add(category.into(), &name)?;
            println!("Added {} task {}: {}", task.category, task.id, task.name);
            list.save(storage, &user_id)?;
        }
        TaskCommand::List {
            user_id,
            category,
            json,
        } => {
            let list = TaskList::load(storage, &user_id)?;
            if json {
                print_json(&list)?;
            } else {
                println!("{}", output::render_tasks(&list, category.map(Into::into)));
                println!();
                println!("{:.0}% complete", list.completion_ratio() * 100.0);
            }
        }
        TaskCommand::Toggle { user_id, id } => {
            let mut list = TaskList::load(storage, &user_id)?;
            let completed = list.toggle(id)?;
            list.save(storage, &user_id)?;
            println!(
                "Task {id} marked {}",
                if completed { "done" } else { "not done" }
            );
        }
        TaskCommand::Remove { user_id, id } => {
            let mut list = TaskList::load(storage, &user_id)?;
            if !list.remove(id) {
                return Err(Error::invalid_input(format!("no task with id {id}")).into());
            }
            list.save(storage, &user_id)?;
            println!("Task {id} removed");
        }
    }
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "config_path": Config::default_config_path(),
            "trainers": stats.trainers,
            "students": stats.students,
            "attendance_records": stats.attendance_records,
            "db_size_bytes": stats.db_size_bytes,
        });
        print_json(&status)?;
    } else {
        println!("trainerlink status");
        println!("------------------");
        println!("Database:      {}", config.database_path().display());
        println!("{}", output::render_stats(&stats));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Location]");
                println!("  Timeout (ms):       {}", config.location.timeout_ms);
                match config.location.max_accuracy_meters {
                    Some(limit) => {
                        println!("  Max accuracy:       {}", output::format_distance(limit));
                    }
                    None => println!("  Max accuracy:       any"),
                }
                println!();
                println!("[Attendance]");
                println!("  History (days):     {}", config.attendance.history_days);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

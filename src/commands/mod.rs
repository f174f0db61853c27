pub mod analysis;
pub mod plan;
pub mod records;
pub mod transfer;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::db::{self, AppState, SETTING_API_KEY, SETTING_USER_PROFILE};
use crate::error::AppError;
use crate::models::{ExerciseEntry, ExerciseKind, MuscleGroup, WorkoutDate};
use records::{parse_exercise_arg, LogChanges, MasterChanges};
use transfer::DuplicatePolicy;

#[derive(Debug, Parser)]
#[command(name = "training-log", version, about = "Strength training log and analytics")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// Per-exercise history series
  Chart {
    /// Only include sessions on or after this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<WorkoutDate>,
  },
  /// Sets per muscle group for a week
  Volume {
    /// Any date inside the target week; defaults to today
    #[arg(long)]
    week_of: Option<WorkoutDate>,
  },
  /// Exercises whose weekly best has plateaued
  Stagnation,
  /// Deload recommendation
  Deload,
  /// Compare each exercise of a log with its previous session
  Progress { log_id: i64 },
  /// Generate today's plan with Gemini
  Plan {
    /// Today's condition or requests
    #[arg(long, default_value = "")]
    memo: String,
  },
  /// Generate and store feedback for a log
  Evaluate { log_id: i64 },
  /// Import a Markdown export
  Import {
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::Skip)]
    on_duplicate: DuplicatePolicy,
  },
  /// Export logs in a date range as Markdown
  Export {
    #[arg(long)]
    start: WorkoutDate,
    #[arg(long)]
    end: WorkoutDate,
    /// Write to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
  },
  /// Store the user profile or Gemini API key
  Settings {
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    api_key: Option<String>,
  },
  /// Record, edit or delete workout logs
  Log {
    #[command(subcommand)]
    command: LogCommand,
  },
  /// Manage registered exercises
  Master {
    #[command(subcommand)]
    command: MasterCommand,
  },
}

#[derive(Debug, Subcommand)]
pub enum LogCommand {
  /// Print all logs, oldest first
  List,
  /// Record a workout
  Add {
    /// Defaults to today
    #[arg(long)]
    date: Option<WorkoutDate>,
    /// `name=60x10,60x8`; repeat for each exercise
    #[arg(short, long = "exercise", required = true, value_parser = parse_exercise_arg)]
    exercises: Vec<ExerciseEntry>,
    #[arg(long)]
    memo: Option<String>,
  },
  /// Change the date, exercises or memo of a log
  Edit {
    id: i64,
    #[arg(long)]
    date: Option<WorkoutDate>,
    /// Replaces all exercises of the log when given
    #[arg(short, long = "exercise", value_parser = parse_exercise_arg)]
    exercises: Vec<ExerciseEntry>,
    /// An empty memo clears it
    #[arg(long)]
    memo: Option<String>,
  },
  /// Delete a log
  Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum MasterCommand {
  /// Print all registered exercises
  List,
  /// Register an exercise; muscles default to the preset for its name
  Add {
    name: String,
    /// weighted, bodyweight or cardio
    #[arg(long, default_value = "weighted")]
    kind: ExerciseKind,
    /// Main target muscles, comma separated
    #[arg(long, value_delimiter = ',')]
    main: Vec<MuscleGroup>,
    /// Sub target muscles, comma separated
    #[arg(long, value_delimiter = ',')]
    sub: Vec<MuscleGroup>,
  },
  /// Rename an exercise or change its kind or muscles
  Edit {
    id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    kind: Option<ExerciseKind>,
    #[arg(long, value_delimiter = ',')]
    main: Vec<MuscleGroup>,
    #[arg(long, value_delimiter = ',')]
    sub: Vec<MuscleGroup>,
  },
  /// Delete an exercise; logs that use it keep their entries
  Delete { id: i64 },
}

/// Local calendar date used as "today" by time-windowed analytics
pub fn today() -> NaiveDate {
  chrono::Local::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

pub async fn dispatch(state: &AppState, command: Command) -> Result<(), AppError> {
  match command {
    Command::Chart { from } => print_json(&analysis::get_exercise_chart(state, from).await?),
    Command::Volume { week_of } => {
      let reference = week_of.map(|d| d.date()).unwrap_or_else(today);
      print_json(&analysis::get_weekly_volume(state, reference).await?)
    }
    Command::Stagnation => print_json(&analysis::get_stagnation(state).await?),
    Command::Deload => print_json(&analysis::get_deload_suggestion(state, today()).await?),
    Command::Progress { log_id } => print_json(&analysis::get_log_progress(state, log_id).await?),
    Command::Plan { memo } => {
      let client = plan::gemini_client(state).await?;
      print_json(&plan::generate_plan(state, &client, &memo, today()).await?)
    }
    Command::Evaluate { log_id } => {
      let client = plan::gemini_client(state).await?;
      println!("{}", plan::evaluate_workout(state, &client, log_id).await?);
      Ok(())
    }
    Command::Import { file, on_duplicate } => {
      let text = fs::read_to_string(&file)?;
      print_json(&transfer::import_markdown(state, &text, on_duplicate).await?)
    }
    Command::Export { start, end, output } => {
      let markdown = transfer::export_markdown(state, start, end).await?;
      match output {
        Some(path) => {
          fs::write(&path, markdown)?;
          info!(path = %path.display(), "Export written");
        }
        None => println!("{}", markdown),
      }
      Ok(())
    }
    Command::Settings { profile, api_key } => {
      if let Some(profile) = profile {
        db::set_setting(&state.db, SETTING_USER_PROFILE, &profile).await?;
      }
      if let Some(api_key) = api_key {
        db::set_setting(&state.db, SETTING_API_KEY, &api_key).await?;
      }
      Ok(())
    }
    Command::Log { command } => dispatch_log(state, command).await,
    Command::Master { command } => dispatch_master(state, command).await,
  }
}

async fn dispatch_log(state: &AppState, command: LogCommand) -> Result<(), AppError> {
  match command {
    LogCommand::List => print_json(&records::list_logs(state).await?),
    LogCommand::Add { date, exercises, memo } => {
      let date = date.unwrap_or_else(|| WorkoutDate::new(today()));
      print_json(&records::add_log(state, date, exercises, memo).await?)
    }
    LogCommand::Edit {
      id,
      date,
      exercises,
      memo,
    } => {
      let changes = LogChanges { date, exercises, memo };
      print_json(&records::edit_log(state, id, changes).await?)
    }
    LogCommand::Delete { id } => records::delete_log(state, id).await,
  }
}

async fn dispatch_master(state: &AppState, command: MasterCommand) -> Result<(), AppError> {
  match command {
    MasterCommand::List => print_json(&records::list_masters(state).await?),
    MasterCommand::Add { name, kind, main, sub } => {
      print_json(&records::add_master(state, &name, kind, &main, &sub).await?)
    }
    MasterCommand::Edit {
      id,
      name,
      kind,
      main,
      sub,
    } => {
      let changes = MasterChanges { name, kind, main, sub };
      print_json(&records::edit_master(state, id, changes).await?)
    }
    MasterCommand::Delete { id } => records::delete_master(state, id).await,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_export_args() {
    let cli = Cli::try_parse_from([
      "training-log",
      "export",
      "--start",
      "2024-06-01",
      "--end",
      "2024-06-30",
    ])
    .unwrap();

    match cli.command {
      Command::Export { start, end, output } => {
        assert_eq!(start.to_string(), "2024-06-01");
        assert_eq!(end.to_string(), "2024-06-30");
        assert_eq!(output, None);
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_import_defaults_to_skip() {
    let cli = Cli::try_parse_from(["training-log", "import", "log.md"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Import { on_duplicate: DuplicatePolicy::Skip, .. }
    ));

    let cli =
      Cli::try_parse_from(["training-log", "import", "log.md", "--on-duplicate", "overwrite"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Import { on_duplicate: DuplicatePolicy::Overwrite, .. }
    ));
  }

  #[test]
  fn test_parse_log_add_args() {
    let cli = Cli::try_parse_from([
      "training-log",
      "log",
      "add",
      "--date",
      "2024-06-12",
      "-e",
      "ベンチプレス=60x10,60x8",
      "--exercise",
      "懸垂=8",
    ])
    .unwrap();

    match cli.command {
      Command::Log {
        command: LogCommand::Add { date, exercises, memo },
      } => {
        assert_eq!(date.map(|d| d.to_string()).as_deref(), Some("2024-06-12"));
        assert_eq!(exercises.len(), 2);
        assert_eq!(exercises[0].sets.len(), 2);
        assert_eq!(exercises[1].name, "懸垂");
        assert_eq!(memo, None);
      }
      other => panic!("unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_log_add_requires_exercise() {
    assert!(Cli::try_parse_from(["training-log", "log", "add"]).is_err());
    assert!(Cli::try_parse_from(["training-log", "log", "add", "-e", "ベンチプレス=60kg"]).is_err());
  }

  #[test]
  fn test_parse_master_args() {
    let cli = Cli::try_parse_from([
      "training-log",
      "master",
      "add",
      "ケーブルクロス",
      "--main",
      "chest",
      "--sub",
      "shoulder,triceps",
    ])
    .unwrap();

    match cli.command {
      Command::Master {
        command: MasterCommand::Add { name, kind, main, sub },
      } => {
        assert_eq!(name, "ケーブルクロス");
        assert_eq!(kind, ExerciseKind::Weighted);
        assert_eq!(main, vec![MuscleGroup::Chest]);
        assert_eq!(sub, vec![MuscleGroup::Shoulder, MuscleGroup::Triceps]);
      }
      other => panic!("unexpected command: {:?}", other),
    }

    assert!(Cli::try_parse_from(["training-log", "master", "add", "x", "--main", "legs"]).is_err());
    assert!(matches!(
      Cli::try_parse_from(["training-log", "master", "edit", "3", "--kind", "cardio"])
        .unwrap()
        .command,
      Command::Master {
        command: MasterCommand::Edit {
          id: 3,
          kind: Some(ExerciseKind::Cardio),
          ..
        }
      }
    ));
  }

  #[test]
  fn test_rejects_loose_dates() {
    assert!(Cli::try_parse_from(["training-log", "chart", "--from", "2024-6-1"]).is_err());
  }
}

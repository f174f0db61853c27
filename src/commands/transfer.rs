use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::catalog::preset_target_muscles;
use crate::db::{self, AppState};
use crate::error::AppError;
use crate::markdown::{format_export_markdown, parse_export_markdown};
use crate::models::{ExerciseKind, NewExerciseMaster, NewWorkoutLog, WorkoutDate};

/// What to do with imported days that already have logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
  /// Keep existing logs, drop the imported day
  Skip,
  /// Replace existing logs on that date
  Overwrite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
  pub imported: usize,
  pub skipped: usize,
  pub registered_exercises: Vec<String>,
}

/// ---------------------------------------------------------------------------
/// Import
/// ---------------------------------------------------------------------------

pub async fn import_markdown(
  state: &AppState,
  text: &str,
  policy: DuplicatePolicy,
) -> Result<ImportSummary, AppError> {
  let parsed = parse_export_markdown(text);
  if parsed.logs.is_empty() {
    warn!("No workout logs found in import");
    return Ok(ImportSummary::default());
  }

  let masters = db::list_exercise_masters(&state.db).await?;
  let new_masters: Vec<NewExerciseMaster> = parsed
    .exercises
    .iter()
    .filter(|exercise| !masters.iter().any(|m| m.name == exercise.name))
    .map(|exercise| NewExerciseMaster {
      name: exercise.name.clone(),
      kind: exercise.kind,
      target_muscles: match exercise.kind {
        ExerciseKind::Cardio => Vec::new(),
        _ => preset_target_muscles(&exercise.name),
      },
    })
    .collect();

  let existing = db::logged_dates(&state.db).await?;
  let (logs, replace_dates, skipped) = resolve_duplicates(parsed.logs, &existing, policy);
  let imported = db::import_workout_logs(&state.db, &new_masters, &logs, &replace_dates).await?;
  let registered_exercises: Vec<String> = new_masters.into_iter().map(|m| m.name).collect();

  info!(
    imported,
    skipped,
    replaced = replace_dates.len(),
    registered = registered_exercises.len(),
    "Import finished"
  );

  Ok(ImportSummary {
    imported,
    skipped,
    registered_exercises,
  })
}

/// Split imported logs by whether their date is already logged.
/// Returns the logs to insert, the dates to clear first, and the skipped count.
fn resolve_duplicates(
  logs: Vec<NewWorkoutLog>,
  existing: &BTreeSet<WorkoutDate>,
  policy: DuplicatePolicy,
) -> (Vec<NewWorkoutLog>, BTreeSet<WorkoutDate>, usize) {
  match policy {
    DuplicatePolicy::Overwrite => {
      let replace = logs
        .iter()
        .map(|l| l.date)
        .filter(|d| existing.contains(d))
        .collect();
      (logs, replace, 0)
    }
    DuplicatePolicy::Skip => {
      let total = logs.len();
      let kept: Vec<NewWorkoutLog> = logs
        .into_iter()
        .filter(|l| !existing.contains(&l.date))
        .collect();
      let skipped = total - kept.len();
      (kept, BTreeSet::new(), skipped)
    }
  }
}

/// ---------------------------------------------------------------------------
/// Export
/// ---------------------------------------------------------------------------

pub async fn export_markdown(
  state: &AppState,
  start: WorkoutDate,
  end: WorkoutDate,
) -> Result<String, AppError> {
  let logs = db::list_logs_between(&state.db, start, end).await?;
  let masters = db::list_exercise_masters(&state.db).await?;
  info!(%start, %end, logs = logs.len(), "Exporting logs");
  Ok(format_export_markdown(&logs, start, end, &masters))
}

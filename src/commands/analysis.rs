use chrono::NaiveDate;
use serde::Serialize;

use crate::chart::{build_exercise_chart_data, ExerciseChartData};
use crate::db::{self, AppState};
use crate::error::AppError;
use crate::metrics::exercise_kind;
use crate::models::{WorkoutDate, WorkoutSet};
use crate::periodization::{generate_deload_suggestion, DeloadSuggestion};
use crate::progress::{calculate_progress, find_previous_sets, format_diff, ProgressComparison};
use crate::stagnation::{detect_stagnation, StagnationInfo};
use crate::volume::{calculate_weekly_volume, format_week_range, generate_volume_advice, WeeklyVolumeData};

/// ---------------------------------------------------------------------------
/// History
/// ---------------------------------------------------------------------------

pub async fn get_exercise_chart(
  state: &AppState,
  from: Option<WorkoutDate>,
) -> Result<Vec<ExerciseChartData>, AppError> {
  let logs = db::list_workout_logs(&state.db).await?;
  let masters = db::list_exercise_masters(&state.db).await?;
  Ok(build_exercise_chart_data(&logs, &masters, from))
}

/// ---------------------------------------------------------------------------
/// Weekly Volume
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct VolumeReport {
  pub week: String,
  pub data: Vec<WeeklyVolumeData>,
  pub advice: Vec<String>,
}

pub async fn get_weekly_volume(state: &AppState, reference: NaiveDate) -> Result<VolumeReport, AppError> {
  let logs = db::list_workout_logs(&state.db).await?;
  let masters = db::list_exercise_masters(&state.db).await?;

  let data = calculate_weekly_volume(&logs, &masters, reference);
  let advice = generate_volume_advice(&data);

  Ok(VolumeReport {
    week: format_week_range(reference),
    data,
    advice,
  })
}

/// ---------------------------------------------------------------------------
/// Stagnation & Deload
/// ---------------------------------------------------------------------------

pub async fn get_stagnation(state: &AppState) -> Result<Vec<StagnationInfo>, AppError> {
  let logs = db::list_workout_logs(&state.db).await?;
  let masters = db::list_exercise_masters(&state.db).await?;
  Ok(detect_stagnation(&logs, &masters))
}

pub async fn get_deload_suggestion(
  state: &AppState,
  today: NaiveDate,
) -> Result<Option<DeloadSuggestion>, AppError> {
  let logs = db::list_workout_logs(&state.db).await?;
  let masters = db::list_exercise_masters(&state.db).await?;
  Ok(generate_deload_suggestion(&logs, &masters, today))
}

/// ---------------------------------------------------------------------------
/// Per-log Progress
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseProgress {
  pub exercise_name: String,
  /// `None` when the exercise has never been done before this log
  pub comparison: Option<ProgressComparison>,
  /// One line per metric, e.g. `最大重量: 80 → 90kg (+10kg ↑)`
  pub summary: Vec<String>,
}

fn summarize(comparison: &ProgressComparison) -> Vec<String> {
  comparison
    .metrics()
    .into_iter()
    .map(|(label, metric, unit)| {
      format!(
        "{}: {} → {}{} ({} {})",
        label,
        metric.previous,
        metric.current,
        unit,
        format_diff(metric.diff, unit),
        metric.status.icon()
      )
    })
    .collect()
}

/// One comparison per distinct exercise in the log, in first-logged order.
/// Repeated entries of the same exercise are compared as one session.
pub async fn get_log_progress(state: &AppState, log_id: i64) -> Result<Vec<ExerciseProgress>, AppError> {
  let log = db::get_workout_log(&state.db, log_id).await?;
  let logs = db::list_workout_logs(&state.db).await?;
  let masters = db::list_exercise_masters(&state.db).await?;

  let mut seen: Vec<&str> = Vec::new();
  for ex in &log.exercises {
    if !seen.contains(&ex.name.as_str()) {
      seen.push(ex.name.as_str());
    }
  }

  let result = seen
    .into_iter()
    .map(|name| {
      let current: Vec<WorkoutSet> = log
        .entries_named(name)
        .flat_map(|ex| ex.sets.iter().cloned())
        .collect();
      let kind = exercise_kind(name, &masters);

      let comparison = find_previous_sets(&logs, name, log.date).map(|previous| {
        calculate_progress(&current, &previous, kind.is_bodyweight(), kind.is_cardio())
      });

      ExerciseProgress {
        exercise_name: name.to_string(),
        summary: comparison.as_ref().map(summarize).unwrap_or_default(),
        comparison,
      }
    })
    .collect();

  Ok(result)
}

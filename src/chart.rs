//! Per-exercise history series for charts
//!
//! Folds the full log history into one date-ascending series per exercise,
//! merging entries that share an exercise name and date.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::metrics::{
  exercise_kind, max_estimated_1rm, max_reps, max_weight, round1, total_distance, total_duration,
  total_reps, total_volume,
};
use crate::models::{ExerciseMaster, WorkoutDate, WorkoutLog, WorkoutSet};

/// All metric primitives for one exercise on one day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExerciseStats {
  pub max_weight: f64,
  pub total_volume: f64,
  pub estimated_1rm: f64,
  pub max_reps: u32,
  pub total_reps: u32,
  /// Minutes
  pub total_duration: f64,
  /// Kilometres
  pub total_distance: f64,
}

impl ExerciseStats {
  pub fn from_sets(sets: &[WorkoutSet]) -> Self {
    Self {
      max_weight: max_weight(sets),
      total_volume: total_volume(sets),
      estimated_1rm: max_estimated_1rm(sets),
      max_reps: max_reps(sets),
      total_reps: total_reps(sets),
      total_duration: total_duration(sets),
      total_distance: total_distance(sets),
    }
  }
}

/// Combine two same-day entries: peaks take the max, totals add up
pub fn merge_exercise_data(existing: &ExerciseStats, new_data: &ExerciseStats) -> ExerciseStats {
  ExerciseStats {
    max_weight: existing.max_weight.max(new_data.max_weight),
    total_volume: existing.total_volume + new_data.total_volume,
    estimated_1rm: existing.estimated_1rm.max(new_data.estimated_1rm),
    max_reps: existing.max_reps.max(new_data.max_reps),
    total_reps: existing.total_reps + new_data.total_reps,
    total_duration: existing.total_duration + new_data.total_duration,
    total_distance: round1(existing.total_distance + new_data.total_distance),
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
  pub date: WorkoutDate,
  #[serde(flatten)]
  pub stats: ExerciseStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseChartData {
  pub name: String,
  pub last_date: WorkoutDate,
  pub data: Vec<ChartPoint>,
  pub is_bodyweight: bool,
  pub is_cardio: bool,
}

/// Build one series per exercise.
///
/// `filter_from` is an inclusive lower bound applied after merging. Exercises with
/// no remaining points are dropped. The result is ordered by most recent date,
/// newest first; ties keep first-logged order.
pub fn build_exercise_chart_data(
  logs: &[WorkoutLog],
  masters: &[ExerciseMaster],
  filter_from: Option<WorkoutDate>,
) -> Vec<ExerciseChartData> {
  let mut order: Vec<&str> = Vec::new();
  let mut by_exercise: HashMap<&str, BTreeMap<WorkoutDate, ExerciseStats>> = HashMap::new();

  for log in logs {
    for ex in &log.exercises {
      let date_map = by_exercise.entry(ex.name.as_str()).or_insert_with(|| {
        order.push(ex.name.as_str());
        BTreeMap::new()
      });

      let stats = ExerciseStats::from_sets(&ex.sets);
      date_map
        .entry(log.date)
        .and_modify(|existing| *existing = merge_exercise_data(existing, &stats))
        .or_insert(stats);
    }
  }

  let mut result: Vec<ExerciseChartData> = order
    .into_iter()
    .filter_map(|name| {
      let date_map = by_exercise.remove(name)?;
      let data: Vec<ChartPoint> = date_map
        .into_iter()
        .filter(|(date, _)| filter_from.map_or(true, |from| *date >= from))
        .map(|(date, stats)| ChartPoint { date, stats })
        .collect();

      let last_date = data.last()?.date;
      let kind = exercise_kind(name, masters);

      Some(ExerciseChartData {
        name: name.to_string(),
        last_date,
        data,
        is_bodyweight: kind.is_bodyweight(),
        is_cardio: kind.is_cardio(),
      })
    })
    .collect();

  result.sort_by(|a, b| b.last_date.cmp(&a.last_date));
  result
}

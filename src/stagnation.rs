//! Stagnation detection over weekly best values
//!
//! An exercise is stagnant when its trailing weeks all sit within ±5% of the
//! latest week's value for at least two weeks running.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::calendar::week_start;
use crate::metrics::{exercise_kind, round1};
use crate::models::{ExerciseKind, ExerciseMaster, WorkoutLog};

pub const STAGNATION_THRESHOLD_PERCENT: f64 = 5.0;
pub const MIN_WEEKS_FOR_STAGNATION: usize = 2;

/// The tracked value for an exercise kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StagnationMetric {
  #[serde(rename = "推定1RM")]
  Estimated1Rm,
  #[serde(rename = "最大回数")]
  MaxReps,
  #[serde(rename = "時間")]
  Duration,
}

impl StagnationMetric {
  pub fn for_kind(kind: ExerciseKind) -> Self {
    match kind {
      ExerciseKind::Cardio => StagnationMetric::Duration,
      ExerciseKind::Bodyweight => StagnationMetric::MaxReps,
      ExerciseKind::Weighted => StagnationMetric::Estimated1Rm,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      StagnationMetric::Estimated1Rm => "推定1RM",
      StagnationMetric::MaxReps => "最大回数",
      StagnationMetric::Duration => "時間",
    }
  }

  pub fn unit(&self) -> &'static str {
    match self {
      StagnationMetric::Estimated1Rm => "kg",
      StagnationMetric::MaxReps => "回",
      StagnationMetric::Duration => "分",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagnationInfo {
  pub exercise_name: String,
  pub metric: StagnationMetric,
  /// Latest week's value, rounded to one decimal
  pub value: f64,
  pub unit: String,
  pub weeks: usize,
}

/// Best value per Monday-start week, oldest first
pub fn weekly_best_metrics(logs: &[WorkoutLog], exercise_name: &str, kind: ExerciseKind) -> Vec<f64> {
  let mut weekly: BTreeMap<chrono::NaiveDate, f64> = BTreeMap::new();

  for log in logs {
    let week = week_start(log.date.date());
    for entry in log.entries_named(exercise_name) {
      let value = kind.primary_metric(&entry.sets);
      let best = weekly.entry(week).or_insert(0.0);
      *best = best.max(value);
    }
  }

  weekly.into_values().collect()
}

fn is_within_threshold(value: f64, baseline: f64) -> bool {
  if baseline == 0.0 {
    return value == 0.0;
  }
  ((value - baseline) / baseline).abs() * 100.0 <= STAGNATION_THRESHOLD_PERCENT
}

/// Consecutive trailing weeks within the band of the latest week, or 0 when the
/// run is shorter than `MIN_WEEKS_FOR_STAGNATION`
pub fn calculate_stagnation_weeks(weekly_values: &[f64]) -> usize {
  let Some((&baseline, earlier)) = weekly_values.split_last() else {
    return 0;
  };
  if weekly_values.len() < MIN_WEEKS_FOR_STAGNATION || baseline == 0.0 {
    return 0;
  }

  let weeks = 1 + earlier
    .iter()
    .rev()
    .take_while(|&&value| is_within_threshold(value, baseline))
    .count();

  if weeks >= MIN_WEEKS_FOR_STAGNATION {
    weeks
  } else {
    0
  }
}

/// All stagnant exercises, longest plateau first
pub fn detect_stagnation(logs: &[WorkoutLog], masters: &[ExerciseMaster]) -> Vec<StagnationInfo> {
  let mut names: Vec<&str> = Vec::new();
  for ex in logs.iter().flat_map(|log| &log.exercises) {
    if !names.contains(&ex.name.as_str()) {
      names.push(&ex.name);
    }
  }

  let mut infos: Vec<StagnationInfo> = names
    .into_iter()
    .filter_map(|name| {
      let kind = exercise_kind(name, masters);
      let weekly = weekly_best_metrics(logs, name, kind);
      let weeks = calculate_stagnation_weeks(&weekly);
      if weeks < MIN_WEEKS_FOR_STAGNATION {
        return None;
      }

      let metric = StagnationMetric::for_kind(kind);
      Some(StagnationInfo {
        exercise_name: name.to_string(),
        metric,
        value: round1(*weekly.last()?),
        unit: metric.unit().to_string(),
        weeks,
      })
    })
    .collect();

  infos.sort_by(|a, b| b.weeks.cmp(&a.weeks));
  infos
}

/// Prompt section listing stagnant exercises; empty when there are none
pub fn format_stagnation_for_prompt(infos: &[StagnationInfo]) -> String {
  if infos.is_empty() {
    return String::new();
  }

  let lines: Vec<String> = infos
    .iter()
    .map(|info| {
      format!(
        "- {}: {} {}{} で {}週間停滞",
        info.exercise_name,
        info.metric.label(),
        info.value,
        info.unit,
        info.weeks
      )
    })
    .collect();

  format!("## 停滞中の種目（対策を考慮してください）\n{}", lines.join("\n"))
}

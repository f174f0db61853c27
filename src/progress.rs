//! Session-over-session progress comparison
//!
//! Compares the sets of one exercise against the previous session and classifies
//! each metric as up / same / down with a symmetric ±5% dead band.

use serde::{Deserialize, Serialize};

use crate::metrics::{
  max_estimated_1rm, max_reps, max_weight, round1, total_distance, total_duration, total_reps,
  total_volume,
};
use crate::models::{ExerciseKind, WorkoutDate, WorkoutLog, WorkoutSet};

/// Changes within ±5% count as maintained
pub const SAME_THRESHOLD_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
  Up,
  Same,
  Down,
}

impl ProgressStatus {
  pub fn icon(&self) -> &'static str {
    match self {
      ProgressStatus::Up => "↑",
      ProgressStatus::Same => "→",
      ProgressStatus::Down => "↓",
    }
  }
}

/// Classify a change. A zero baseline is `up` for any positive current value.
pub fn get_progress_status(current: f64, previous: f64) -> ProgressStatus {
  if previous == 0.0 {
    return if current > 0.0 {
      ProgressStatus::Up
    } else {
      ProgressStatus::Same
    };
  }

  let diff_percent = (current - previous) / previous * 100.0;
  if diff_percent > SAME_THRESHOLD_PERCENT {
    ProgressStatus::Up
  } else if diff_percent < -SAME_THRESHOLD_PERCENT {
    ProgressStatus::Down
  } else {
    ProgressStatus::Same
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetric {
  pub current: f64,
  pub previous: f64,
  pub diff: f64,
  pub diff_percent: f64,
  pub status: ProgressStatus,
}

impl ProgressMetric {
  pub fn new(current: f64, previous: f64) -> Self {
    let diff = current - previous;
    let diff_percent = if previous != 0.0 {
      round1(diff / previous * 100.0)
    } else if current > 0.0 {
      100.0
    } else {
      0.0
    };

    Self {
      current,
      previous,
      diff: round1(diff),
      diff_percent,
      status: get_progress_status(current, previous),
    }
  }
}

/// Metric set depends on the exercise kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressComparison {
  Weighted {
    max_weight: ProgressMetric,
    total_volume: ProgressMetric,
    estimated_1rm: ProgressMetric,
  },
  Bodyweight {
    max_reps: ProgressMetric,
    total_reps: ProgressMetric,
  },
  Cardio {
    total_duration: ProgressMetric,
    total_distance: ProgressMetric,
  },
}

impl ProgressComparison {
  /// (label, metric, unit) triples in display order
  pub fn metrics(&self) -> Vec<(&'static str, &ProgressMetric, &'static str)> {
    match self {
      ProgressComparison::Weighted {
        max_weight,
        total_volume,
        estimated_1rm,
      } => vec![
        ("最大重量", max_weight, "kg"),
        ("ボリューム", total_volume, "kg"),
        ("1RM", estimated_1rm, "kg"),
      ],
      ProgressComparison::Bodyweight { max_reps, total_reps } => vec![
        ("最大回数", max_reps, "回"),
        ("合計回数", total_reps, "回"),
      ],
      ProgressComparison::Cardio {
        total_duration,
        total_distance,
      } => vec![
        ("時間", total_duration, "分"),
        ("距離", total_distance, "km"),
      ],
    }
  }
}

pub fn calculate_weight_progress(current: &[WorkoutSet], previous: &[WorkoutSet]) -> ProgressComparison {
  ProgressComparison::Weighted {
    max_weight: ProgressMetric::new(max_weight(current), max_weight(previous)),
    total_volume: ProgressMetric::new(total_volume(current), total_volume(previous)),
    estimated_1rm: ProgressMetric::new(max_estimated_1rm(current), max_estimated_1rm(previous)),
  }
}

pub fn calculate_bodyweight_progress(current: &[WorkoutSet], previous: &[WorkoutSet]) -> ProgressComparison {
  ProgressComparison::Bodyweight {
    max_reps: ProgressMetric::new(max_reps(current) as f64, max_reps(previous) as f64),
    total_reps: ProgressMetric::new(total_reps(current) as f64, total_reps(previous) as f64),
  }
}

pub fn calculate_cardio_progress(current: &[WorkoutSet], previous: &[WorkoutSet]) -> ProgressComparison {
  ProgressComparison::Cardio {
    total_duration: ProgressMetric::new(total_duration(current), total_duration(previous)),
    total_distance: ProgressMetric::new(total_distance(current), total_distance(previous)),
  }
}

/// Dispatch on the master flags; cardio takes priority over bodyweight
pub fn calculate_progress(
  current: &[WorkoutSet],
  previous: &[WorkoutSet],
  is_bodyweight: bool,
  is_cardio: bool,
) -> ProgressComparison {
  match ExerciseKind::from_flags(is_bodyweight, is_cardio) {
    ExerciseKind::Cardio => calculate_cardio_progress(current, previous),
    ExerciseKind::Bodyweight => calculate_bodyweight_progress(current, previous),
    ExerciseKind::Weighted => calculate_weight_progress(current, previous),
  }
}

/// Signed diff for display, e.g. `+2.5kg`, `-1回`, `0kg`
pub fn format_diff(diff: f64, unit: &str) -> String {
  let sign = if diff > 0.0 { "+" } else { "" };
  format!("{}{}{}", sign, diff, unit)
}

/// Sets of the most recent session before `before` that contains `exercise_name`.
/// Multiple entries for the exercise on that day are concatenated.
pub fn find_previous_sets(
  logs: &[WorkoutLog],
  exercise_name: &str,
  before: WorkoutDate,
) -> Option<Vec<WorkoutSet>> {
  let latest = logs
    .iter()
    .filter(|log| log.date < before)
    .filter(|log| log.entries_named(exercise_name).next().is_some())
    .max_by_key(|log| log.date)?;

  Some(
    latest
      .entries_named(exercise_name)
      .flat_map(|ex| ex.sets.iter().cloned())
      .collect(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{mock_log, weighted_sets};

  #[test]
  fn test_status_zero_baseline() {
    assert_eq!(get_progress_status(10.0, 0.0), ProgressStatus::Up);
    assert_eq!(get_progress_status(0.0, 0.0), ProgressStatus::Same);
  }

  #[test]
  fn test_status_dead_band_boundaries() {
    assert_eq!(get_progress_status(105.0, 100.0), ProgressStatus::Same);
    assert_eq!(get_progress_status(105.1, 100.0), ProgressStatus::Up);
    assert_eq!(get_progress_status(95.0, 100.0), ProgressStatus::Same);
    assert_eq!(get_progress_status(94.0, 100.0), ProgressStatus::Down);
  }

  #[test]
  fn test_metric_zero_previous_percent() {
    let metric = ProgressMetric::new(50.0, 0.0);
    assert_eq!(metric.diff_percent, 100.0);
    assert_eq!(metric.status, ProgressStatus::Up);

    let metric = ProgressMetric::new(0.0, 0.0);
    assert_eq!(metric.diff_percent, 0.0);
    assert_eq!(metric.status, ProgressStatus::Same);
  }

  #[test]
  fn test_weighted_progress_up() {
    let current = vec![WorkoutSet::weighted(100.0, 5)];
    let previous = vec![WorkoutSet::weighted(90.0, 5)];

    match calculate_progress(&current, &previous, false, false) {
      ProgressComparison::Weighted { max_weight, .. } => {
        assert_eq!(max_weight.diff, 10.0);
        assert_eq!(max_weight.diff_percent, 11.1);
        assert_eq!(max_weight.status, ProgressStatus::Up);
      }
      other => panic!("expected weighted comparison, got {:?}", other),
    }
  }

  #[test]
  fn test_bodyweight_progress_down() {
    let current = vec![WorkoutSet::bodyweight(8)];
    let previous = vec![WorkoutSet::bodyweight(10)];

    match calculate_progress(&current, &previous, true, false) {
      ProgressComparison::Bodyweight { max_reps, total_reps } => {
        assert_eq!(max_reps.diff, -2.0);
        assert_eq!(max_reps.diff_percent, -20.0);
        assert_eq!(max_reps.status, ProgressStatus::Down);
        assert_eq!(total_reps.status, ProgressStatus::Down);
      }
      other => panic!("expected bodyweight comparison, got {:?}", other),
    }
  }

  #[test]
  fn test_cardio_takes_priority() {
    let current = vec![WorkoutSet::cardio(30.0, Some(5.0))];
    let previous = vec![WorkoutSet::cardio(30.0, Some(4.9))];

    match calculate_progress(&current, &previous, true, true) {
      ProgressComparison::Cardio {
        total_duration,
        total_distance,
      } => {
        assert_eq!(total_duration.status, ProgressStatus::Same);
        assert_eq!(total_distance.diff, 0.1);
        assert_eq!(total_distance.status, ProgressStatus::Same);
      }
      other => panic!("expected cardio comparison, got {:?}", other),
    }
  }

  #[test]
  fn test_format_diff_sign() {
    assert_eq!(format_diff(2.5, "kg"), "+2.5kg");
    assert_eq!(format_diff(-1.0, "回"), "-1回");
    assert_eq!(format_diff(0.0, "kg"), "0kg");
  }

  #[test]
  fn test_find_previous_sets_picks_latest_earlier_session() {
    let logs = vec![
      mock_log("2024-05-01", &[("ベンチプレス", weighted_sets(&[(60.0, 10)]))]),
      mock_log("2024-05-08", &[("ベンチプレス", weighted_sets(&[(65.0, 10)]))]),
      mock_log("2024-05-10", &[("スクワット", weighted_sets(&[(100.0, 5)]))]),
      mock_log("2024-05-15", &[("ベンチプレス", weighted_sets(&[(70.0, 8)]))]),
    ];

    let prev = find_previous_sets(&logs, "ベンチプレス", "2024-05-15".parse().unwrap()).unwrap();
    assert_eq!(prev, weighted_sets(&[(65.0, 10)]));

    assert!(find_previous_sets(&logs, "ベンチプレス", "2024-05-01".parse().unwrap()).is_none());
  }
}

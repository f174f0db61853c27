//! Weekly training volume per muscle group
//!
//! Sets count fully toward an exercise's main muscles and at half weight toward
//! its secondary muscles. Weeks run Monday through Sunday.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::calendar::{week_end, week_start};
use crate::metrics::target_muscles;
use crate::models::{ExerciseMaster, MuscleGroup, WorkoutLog};

pub const RECOMMENDED_MIN_SETS: f64 = 10.0;
pub const RECOMMENDED_MAX_SETS: f64 = 20.0;
const SUB_SET_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetRange {
  pub min: f64,
  pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyVolumeData {
  pub muscle: MuscleGroup,
  pub label: String,
  pub main_sets: u32,
  pub sub_sets: u32,
  /// main_sets + sub_sets × 0.5
  pub total_sets: f64,
  pub recommended: SetRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeStatus {
  None,
  Insufficient,
  Optimal,
  Excessive,
}

pub fn get_volume_status(total_sets: f64) -> VolumeStatus {
  if total_sets == 0.0 {
    VolumeStatus::None
  } else if total_sets < RECOMMENDED_MIN_SETS {
    VolumeStatus::Insufficient
  } else if total_sets <= RECOMMENDED_MAX_SETS {
    VolumeStatus::Optimal
  } else {
    VolumeStatus::Excessive
  }
}

/// Per-muscle set counts for the week containing `reference`.
/// Always returns all nine groups in `MuscleGroup::ALL` order.
pub fn calculate_weekly_volume(
  logs: &[WorkoutLog],
  masters: &[ExerciseMaster],
  reference: NaiveDate,
) -> Vec<WeeklyVolumeData> {
  let start = week_start(reference);
  let end = week_end(reference);

  let mut counts: HashMap<MuscleGroup, (u32, u32)> = HashMap::new();

  for log in logs.iter().filter(|log| (start..=end).contains(&log.date.date())) {
    for exercise in &log.exercises {
      let set_count = exercise.sets.len() as u32;
      for target in target_muscles(&exercise.name, masters) {
        let entry = counts.entry(target.muscle).or_insert((0, 0));
        if target.is_main {
          entry.0 += set_count;
        } else {
          entry.1 += set_count;
        }
      }
    }
  }

  MuscleGroup::ALL
    .iter()
    .map(|&muscle| {
      let (main_sets, sub_sets) = counts.get(&muscle).copied().unwrap_or((0, 0));
      WeeklyVolumeData {
        muscle,
        label: muscle.label().to_string(),
        main_sets,
        sub_sets,
        total_sets: main_sets as f64 + sub_sets as f64 * SUB_SET_WEIGHT,
        recommended: SetRange {
          min: RECOMMENDED_MIN_SETS,
          max: RECOMMENDED_MAX_SETS,
        },
      }
    })
    .collect()
}

/// One advice line per insufficient or excessive muscle group
pub fn generate_volume_advice(data: &[WeeklyVolumeData]) -> Vec<String> {
  data
    .iter()
    .filter_map(|d| match get_volume_status(d.total_sets) {
      VolumeStatus::Excessive => Some(format!(
        "{}が{:.1}セットで過多です。回復のためセット数を減らすことを検討してください",
        d.label, d.total_sets
      )),
      VolumeStatus::Insufficient => Some(format!(
        "{}が{:.1}セットで不足です。種目の追加を検討してください",
        d.label, d.total_sets
      )),
      _ => None,
    })
    .collect()
}

/// Prompt section listing out-of-band groups; `None` when nothing to report
pub fn format_volume_for_prompt(data: &[WeeklyVolumeData]) -> Option<String> {
  let describe = |status: VolumeStatus| -> Vec<String> {
    data
      .iter()
      .filter(|d| get_volume_status(d.total_sets) == status)
      .map(|d| format!("{}({:.1}セット)", d.label, d.total_sets))
      .collect()
  };

  let insufficient = describe(VolumeStatus::Insufficient);
  let excessive = describe(VolumeStatus::Excessive);

  if insufficient.is_empty() && excessive.is_empty() {
    return None;
  }

  let mut parts = Vec::new();
  if !insufficient.is_empty() {
    parts.push(format!("不足: {}", insufficient.join(", ")));
  }
  if !excessive.is_empty() {
    parts.push(format!("過多: {}", excessive.join(", ")));
  }

  Some(format!(
    "週間ボリューム状況（推奨: 各部位10-20セット/週）\n{}",
    parts.join("\n")
  ))
}

/// Week range for display, e.g. `6/10 - 6/16`
pub fn format_week_range(reference: NaiveDate) -> String {
  let start = week_start(reference);
  let end = week_end(reference);
  format!("{} - {}", start.format("%-m/%-d"), end.format("%-m/%-d"))
}

//! Periodization advisor
//!
//! Suggests a deload week when training has run uninterrupted for too long or
//! when several exercises are trending down over the last two weeks.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::calendar::{week_start, weeks_between};
use crate::metrics::{exercise_kind, round1};
use crate::models::{ExerciseKind, ExerciseMaster, WorkoutLog};

/// ---------------------------------------------------------------------------
/// Thresholds
/// ---------------------------------------------------------------------------

/// Weeks of uninterrupted training before a deload is suggested
pub const CONSECUTIVE_WEEKS_THRESHOLD: usize = 4;

/// Change (percent) at or below which an exercise counts as declining
pub const PERFORMANCE_DECLINE_THRESHOLD: f64 = -5.0;

/// Length of each comparison window
pub const PERFORMANCE_CHECK_WEEKS: i64 = 2;

/// Declining exercises required before decline wins over the streak rule
const MIN_DECLINES_FOR_DELOAD: usize = 2;

/// Names listed in the suggestion message
const MAX_NAMES_IN_MESSAGE: usize = 3;

/// ---------------------------------------------------------------------------
/// Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDecline {
  pub exercise_name: String,
  /// Negative percentage, rounded to one decimal
  pub decline_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DeloadReason {
  ConsecutiveWeeks,
  PerformanceDecline { declines: Vec<PerformanceDecline> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeloadSuggestion {
  #[serde(flatten)]
  pub reason: DeloadReason,
  pub message: String,
  pub weeks_training: usize,
}

/// ---------------------------------------------------------------------------
/// Training Streak
/// ---------------------------------------------------------------------------

/// Number of back-to-back training weeks ending this week or last week.
///
/// A week counts when it holds at least one log. If the most recent training week
/// is more than one week before the current week the streak has lapsed and the
/// result is 0.
pub fn calculate_consecutive_training_weeks(logs: &[WorkoutLog], today: NaiveDate) -> usize {
  let weeks: BTreeSet<NaiveDate> = logs.iter().map(|log| week_start(log.date.date())).collect();

  let mut newest_first = weeks.into_iter().rev();
  let Some(latest) = newest_first.next() else {
    return 0;
  };

  if weeks_between(week_start(today), latest) > 1 {
    return 0;
  }

  let mut consecutive = 1;
  let mut previous = latest;
  for week in newest_first {
    if weeks_between(previous, week) != 1 {
      break;
    }
    consecutive += 1;
    previous = week;
  }

  consecutive
}

/// ---------------------------------------------------------------------------
/// Performance Decline
/// ---------------------------------------------------------------------------

/// Percent change between the best value of the last two weeks and the best value
/// of the two weeks before that. `None` when either window is empty, when the
/// exercise appears in fewer than two logs, or when the earlier best is 0.
fn performance_change(
  logs: &[WorkoutLog],
  exercise_name: &str,
  kind: ExerciseKind,
  today: NaiveDate,
) -> Option<f64> {
  let window = Duration::days(PERFORMANCE_CHECK_WEEKS * 7);
  let recent_from = today - window;
  let previous_from = today - window * 2;

  let mut appearances = 0;
  let mut recent_max: Option<f64> = None;
  let mut previous_max: Option<f64> = None;

  for log in logs {
    let date = log.date.date();
    let mut entries = log.entries_named(exercise_name).peekable();
    if entries.peek().is_none() {
      continue;
    }
    appearances += 1;

    let slot = if date > recent_from {
      &mut recent_max
    } else if date > previous_from {
      &mut previous_max
    } else {
      continue;
    };

    for entry in entries {
      let value = kind.primary_metric(&entry.sets);
      *slot = Some(slot.map_or(value, |best: f64| best.max(value)));
    }
  }

  if appearances < 2 {
    return None;
  }

  let recent = recent_max?;
  let previous = previous_max?;
  if previous == 0.0 {
    return None;
  }

  Some((recent - previous) / previous * 100.0)
}

/// Exercises whose recent best fell at least 5% below the preceding window,
/// steepest decline first
pub fn detect_performance_decline(
  logs: &[WorkoutLog],
  masters: &[ExerciseMaster],
  today: NaiveDate,
) -> Vec<PerformanceDecline> {
  let mut names: Vec<&str> = Vec::new();
  for ex in logs.iter().flat_map(|log| &log.exercises) {
    if !names.contains(&ex.name.as_str()) {
      names.push(&ex.name);
    }
  }

  let mut declines: Vec<PerformanceDecline> = names
    .into_iter()
    .filter_map(|name| {
      let kind = exercise_kind(name, masters);
      let change = performance_change(logs, name, kind, today)?;
      (change <= PERFORMANCE_DECLINE_THRESHOLD).then(|| PerformanceDecline {
        exercise_name: name.to_string(),
        decline_percent: round1(change),
      })
    })
    .collect();

  declines.sort_by(|a, b| a.decline_percent.total_cmp(&b.decline_percent));
  declines
}

/// ---------------------------------------------------------------------------
/// Deload Suggestion
/// ---------------------------------------------------------------------------

/// Performance decline takes priority over the training streak
pub fn generate_deload_suggestion(
  logs: &[WorkoutLog],
  masters: &[ExerciseMaster],
  today: NaiveDate,
) -> Option<DeloadSuggestion> {
  let weeks_training = calculate_consecutive_training_weeks(logs, today);
  let declines = detect_performance_decline(logs, masters, today);

  debug!(
    weeks_training,
    declines = declines.len(),
    "Evaluating deload suggestion"
  );

  if declines.len() >= MIN_DECLINES_FOR_DELOAD {
    let names: Vec<&str> = declines
      .iter()
      .take(MAX_NAMES_IN_MESSAGE)
      .map(|d| d.exercise_name.as_str())
      .collect();

    return Some(DeloadSuggestion {
      message: format!(
        "{}などでパフォーマンスが低下しています。ディロード週（回復週）を検討してください。",
        names.join("、")
      ),
      reason: DeloadReason::PerformanceDecline { declines },
      weeks_training,
    });
  }

  if weeks_training >= CONSECUTIVE_WEEKS_THRESHOLD {
    return Some(DeloadSuggestion {
      reason: DeloadReason::ConsecutiveWeeks,
      message: format!(
        "{}週連続でトレーニングを継続しています。ディロード週（回復週）を検討してください。",
        weeks_training
      ),
      weeks_training,
    });
  }

  None
}

/// Prompt section with the deload reason and plan instructions
pub fn format_deload_for_prompt(suggestion: &DeloadSuggestion) -> String {
  let mut lines = vec!["## ディロード推奨".to_string()];

  match &suggestion.reason {
    DeloadReason::ConsecutiveWeeks => {
      lines.push(format!(
        "- 理由: {}週連続のトレーニング継続",
        suggestion.weeks_training
      ));
    }
    DeloadReason::PerformanceDecline { declines } => {
      lines.push("- 理由: パフォーマンス低下を検出".to_string());
      for d in declines {
        lines.push(format!("  - {}: {}%", d.exercise_name, d.decline_percent));
      }
    }
  }

  lines.push(String::new());
  lines.push("【ディロード時のプラン指示】".to_string());
  lines.push("- ボリュームを通常の50-60%に抑える".to_string());
  lines.push("- 重量は維持または少し軽く".to_string());
  lines.push("- セット数を減らす（3セット→2セット）".to_string());
  lines.push("- 種目数も減らす".to_string());

  lines.join("\n")
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

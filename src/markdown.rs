//! Markdown export and import of workout logs
//!
//! The export format is line oriented:
//!
//! ```text
//! # トレーニング記録 2024-06-01 〜 2024-06-30
//!
//! ## 2024-06-12
//!
//! ### ベンチプレス
//! - 1セット目: 60kg × 10回
//!
//! #### メモ
//! 調子良い
//!
//! ---
//! ```
//!
//! The parser accepts anything the exporter writes, so an export can be
//! re-imported without loss.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

use crate::metrics::exercise_kind;
use crate::models::{
  ExerciseEntry, ExerciseKind, ExerciseMaster, NewWorkoutLog, WorkoutDate, WorkoutLog, WorkoutSet,
};

/// ---------------------------------------------------------------------------
/// Export
/// ---------------------------------------------------------------------------

fn format_set_line(index: usize, set: &WorkoutSet, kind: ExerciseKind) -> String {
  match set {
    WorkoutSet::Cardio {
      duration,
      distance: Some(distance),
    } => format!("- {}分 / {}km", duration, distance),
    WorkoutSet::Cardio { duration, distance: None } => format!("- {}分", duration),
    WorkoutSet::Bodyweight { reps } => format!("- {}セット目: {}回", index + 1, reps),
    WorkoutSet::Weighted { reps, .. } if kind.is_bodyweight() => {
      format!("- {}セット目: {}回", index + 1, reps)
    }
    WorkoutSet::Weighted { weight, reps } => {
      format!("- {}セット目: {}kg × {}回", index + 1, weight, reps)
    }
  }
}

/// Render logs newest first. Returns an empty string when there are no logs.
pub fn format_export_markdown(
  logs: &[WorkoutLog],
  start: WorkoutDate,
  end: WorkoutDate,
  masters: &[ExerciseMaster],
) -> String {
  if logs.is_empty() {
    return String::new();
  }

  let mut sorted: Vec<&WorkoutLog> = logs.iter().collect();
  sorted.sort_by(|a, b| b.date.cmp(&a.date));

  let mut lines = vec![format!("# トレーニング記録 {} 〜 {}", start, end), String::new()];

  for (i, log) in sorted.iter().enumerate() {
    lines.push(format!("## {}", log.date));
    lines.push(String::new());

    for ex in &log.exercises {
      let kind = exercise_kind(&ex.name, masters);
      lines.push(format!("### {}", ex.name));
      for (index, set) in ex.sets.iter().enumerate() {
        lines.push(format_set_line(index, set, kind));
      }
      lines.push(String::new());
    }

    if let Some(memo) = log.memo.as_deref().filter(|m| !m.is_empty()) {
      lines.push("#### メモ".to_string());
      lines.push(memo.to_string());
      lines.push(String::new());
    }

    if i + 1 < sorted.len() {
      lines.push("---".to_string());
      lines.push(String::new());
    }
  }

  lines.join("\n")
}

/// ---------------------------------------------------------------------------
/// Import
/// ---------------------------------------------------------------------------

static DATE_HEADER: LazyLock<Option<Regex>> =
  LazyLock::new(|| Regex::new(r"^## (\d{4}-\d{2}-\d{2})").ok());

static EXERCISE_HEADER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^### (.+)").ok());

static MEMO_HEADER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^#### メモ").ok());

static WEIGHTED_SET: LazyLock<Option<Regex>> =
  LazyLock::new(|| Regex::new(r"^- \d+セット目: ([\d.]+)kg × (\d+)回").ok());

static BODYWEIGHT_SET: LazyLock<Option<Regex>> =
  LazyLock::new(|| Regex::new(r"^- \d+セット目: (\d+)回").ok());

// Minutes may be fractional
static CARDIO_WITH_DISTANCE: LazyLock<Option<Regex>> =
  LazyLock::new(|| Regex::new(r"^- ([\d.]+)分 / ([\d.]+)km").ok());

static CARDIO_SET: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^- ([\d.]+)分$").ok());

fn captures<'t>(pattern: &LazyLock<Option<Regex>>, line: &'t str) -> Option<regex::Captures<'t>> {
  pattern.as_ref()?.captures(line)
}

fn matches(pattern: &LazyLock<Option<Regex>>, line: &str) -> bool {
  pattern.as_ref().is_some_and(|re| re.is_match(line))
}

/// Exercise seen during import, with the kind inferred from its first parsed set
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExerciseInfo {
  pub name: String,
  pub kind: ExerciseKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseResult {
  pub logs: Vec<NewWorkoutLog>,
  pub exercises: Vec<ParsedExerciseInfo>,
}

/// Parse one set line. Cardio forms are tried before the bodyweight form.
pub fn parse_set_line(line: &str) -> Option<(WorkoutSet, ExerciseKind)> {
  if let Some(caps) = captures(&WEIGHTED_SET, line) {
    let weight = caps[1].parse().ok()?;
    let reps = caps[2].parse().ok()?;
    return Some((WorkoutSet::weighted(weight, reps), ExerciseKind::Weighted));
  }

  if let Some(caps) = captures(&CARDIO_WITH_DISTANCE, line) {
    let duration = caps[1].parse().ok()?;
    let distance = caps[2].parse().ok()?;
    return Some((WorkoutSet::cardio(duration, Some(distance)), ExerciseKind::Cardio));
  }

  if let Some(caps) = captures(&CARDIO_SET, line) {
    let duration = caps[1].parse().ok()?;
    return Some((WorkoutSet::cardio(duration, None), ExerciseKind::Cardio));
  }

  if let Some(caps) = captures(&BODYWEIGHT_SET, line) {
    let reps = caps[1].parse().ok()?;
    return Some((WorkoutSet::bodyweight(reps), ExerciseKind::Bodyweight));
  }

  None
}

#[derive(Default)]
struct DayBuilder {
  date: Option<WorkoutDate>,
  exercises: Vec<ExerciseEntry>,
  current: Option<ExerciseEntry>,
  memo: Vec<String>,
  in_memo: bool,
}

impl DayBuilder {
  fn finish_exercise(&mut self) {
    if let Some(ex) = self.current.take() {
      if !ex.sets.is_empty() {
        self.exercises.push(ex);
      }
    }
  }

  /// Emit the day if it has a date and at least one exercise, then reset
  fn finish_day(&mut self, logs: &mut Vec<NewWorkoutLog>) {
    self.finish_exercise();
    let day = std::mem::take(self);
    if let Some(date) = day.date {
      if !day.exercises.is_empty() {
        logs.push(NewWorkoutLog {
          date,
          exercises: day.exercises,
          memo: (!day.memo.is_empty()).then(|| day.memo.join("\n")),
        });
      }
    }
  }
}

/// Parse exported Markdown back into logs.
///
/// Unrecognized lines are ignored. Exercises with no parsed sets and days with
/// no exercises are dropped.
pub fn parse_export_markdown(text: &str) -> ParseResult {
  let mut result = ParseResult::default();
  let mut day = DayBuilder::default();

  for raw in text.lines() {
    let line = raw.trim();

    if let Some(caps) = captures(&DATE_HEADER, line) {
      day.finish_day(&mut result.logs);
      match caps[1].parse::<WorkoutDate>() {
        Ok(date) => day.date = Some(date),
        Err(e) => warn!(line, error = %e, "Skipping day with invalid date"),
      }
      continue;
    }

    if let Some(caps) = captures(&EXERCISE_HEADER, line) {
      day.finish_exercise();
      day.in_memo = false;
      day.current = Some(ExerciseEntry::new(caps[1].trim(), Vec::new()));
      continue;
    }

    if matches(&MEMO_HEADER, line) {
      day.finish_exercise();
      day.in_memo = true;
      continue;
    }

    if line == "---" {
      continue;
    }

    if day.in_memo {
      if day.date.is_some() && !line.is_empty() {
        day.memo.push(line.to_string());
      }
      continue;
    }

    let Some(current) = day.current.as_mut() else {
      continue;
    };
    if let Some((set, kind)) = parse_set_line(line) {
      current.sets.push(set);
      if !result.exercises.iter().any(|e| e.name == current.name) {
        result.exercises.push(ParsedExerciseInfo {
          name: current.name.clone(),
          kind,
        });
      }
    }
  }

  day.finish_day(&mut result.logs);
  result
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

//! Per-set metric primitives
//!
//! Pure functions over a slice of sets. Every function is total: empty input
//! yields 0 rather than an error.

use crate::models::{ExerciseKind, ExerciseMaster, TargetMuscle, WorkoutSet};

/// Round to one decimal place, halves toward positive infinity
pub fn round1(value: f64) -> f64 {
  (value * 10.0 + 0.5).floor() / 10.0
}

/// ---------------------------------------------------------------------------
/// Strength Metrics
/// ---------------------------------------------------------------------------

/// Estimated one-rep max (Epley): weight × (1 + reps / 30), 0 when reps is 0
pub fn calculate_1rm(weight: f64, reps: u32) -> f64 {
  if reps == 0 {
    return 0.0;
  }
  round1(weight * (1.0 + reps as f64 / 30.0))
}

pub fn max_weight(sets: &[WorkoutSet]) -> f64 {
  sets.iter().map(WorkoutSet::weight).fold(0.0, f64::max)
}

/// Σ weight × reps
pub fn total_volume(sets: &[WorkoutSet]) -> f64 {
  sets.iter().map(|s| s.weight() * s.reps() as f64).sum()
}

pub fn max_estimated_1rm(sets: &[WorkoutSet]) -> f64 {
  sets
    .iter()
    .map(|s| calculate_1rm(s.weight(), s.reps()))
    .fold(0.0, f64::max)
}

pub fn max_reps(sets: &[WorkoutSet]) -> u32 {
  sets.iter().map(WorkoutSet::reps).max().unwrap_or(0)
}

pub fn total_reps(sets: &[WorkoutSet]) -> u32 {
  sets.iter().map(WorkoutSet::reps).sum()
}

/// ---------------------------------------------------------------------------
/// Cardio Metrics
/// ---------------------------------------------------------------------------

/// Total minutes
pub fn total_duration(sets: &[WorkoutSet]) -> f64 {
  sets.iter().map(WorkoutSet::duration).sum()
}

/// Total km, rounded to one decimal
pub fn total_distance(sets: &[WorkoutSet]) -> f64 {
  round1(sets.iter().map(WorkoutSet::distance).sum())
}

impl ExerciseKind {
  /// The value tracked week over week: duration for cardio, max reps for
  /// bodyweight, estimated 1RM otherwise
  pub fn primary_metric(&self, sets: &[WorkoutSet]) -> f64 {
    match self {
      ExerciseKind::Cardio => total_duration(sets),
      ExerciseKind::Bodyweight => max_reps(sets) as f64,
      ExerciseKind::Weighted => max_estimated_1rm(sets),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Lookup
/// ---------------------------------------------------------------------------

/// Resolve a logged exercise name to its master. Exact string match.
pub fn find_master<'a>(name: &str, masters: &'a [ExerciseMaster]) -> Option<&'a ExerciseMaster> {
  masters.iter().find(|m| m.name == name)
}

/// Unregistered exercises are treated as weighted
pub fn exercise_kind(name: &str, masters: &[ExerciseMaster]) -> ExerciseKind {
  find_master(name, masters).map(|m| m.kind).unwrap_or_default()
}

pub fn is_bodyweight_exercise(name: &str, masters: &[ExerciseMaster]) -> bool {
  exercise_kind(name, masters).is_bodyweight()
}

pub fn is_cardio_exercise(name: &str, masters: &[ExerciseMaster]) -> bool {
  exercise_kind(name, masters).is_cardio()
}

/// Target muscles of a registered exercise; empty when unregistered
pub fn target_muscles<'a>(name: &str, masters: &'a [ExerciseMaster]) -> &'a [TargetMuscle] {
  find_master(name, masters)
    .map(|m| m.target_muscles.as_slice())
    .unwrap_or(&[])
}

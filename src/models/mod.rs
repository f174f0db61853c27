pub mod exercise;
pub mod workout;

use thiserror::Error;

pub use exercise::{ExerciseKind, ExerciseMaster, MuscleGroup, NewExerciseMaster, TargetMuscle};
pub use workout::{ExerciseEntry, NewWorkoutLog, WorkoutDate, WorkoutLog, WorkoutSet};

/// Validation failures at the persistence / import boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
  #[error("Invalid date (expected YYYY-MM-DD): {0}")]
  InvalidDate(String),

  #[error("Invalid {field}: {value}")]
  InvalidSet { field: &'static str, value: f64 },

  #[error("Exercise name must not be empty")]
  EmptyName,

  #[error("Exercise name has leading or trailing whitespace: {0:?}")]
  UntrimmedName(String),

  #[error("Cardio exercise cannot have target muscles: {0}")]
  CardioWithTargets(String),

  #[error("Muscle group listed twice: {0}")]
  DuplicateMuscle(&'static str),

  #[error("Unknown exercise kind: {0}")]
  UnknownKind(String),

  #[error("Unknown muscle group: {0}")]
  UnknownMuscle(String),

  #[error("Exercise already exists: {0}")]
  DuplicateName(String),

  #[error("Invalid set (expected 60x10, 10, 30min or 30min/5km): {0}")]
  InvalidSetSpec(String),
}

/// Names join logs to masters by exact match, so both sides must be trimmed
pub(crate) fn validate_exercise_name(name: &str) -> Result<(), ModelError> {
  if name.trim().is_empty() {
    return Err(ModelError::EmptyName);
  }
  if name.trim() != name {
    return Err(ModelError::UntrimmedName(name.to_string()));
  }
  Ok(())
}

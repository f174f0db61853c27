use tracing::{info, warn};

use crate::catalog::preset_target_muscles;
use crate::db::{self, AppState};
use crate::error::AppError;
use crate::models::{
  ExerciseEntry, ExerciseKind, ExerciseMaster, ModelError, MuscleGroup, NewExerciseMaster,
  NewWorkoutLog, TargetMuscle, WorkoutDate, WorkoutLog, WorkoutSet,
};

/// ---------------------------------------------------------------------------
/// Command-line Exercise Entries
/// ---------------------------------------------------------------------------

/// Parse `name=60x10,60x8` into a logged exercise.
///
/// Set forms: `60x10` (weighted), `10` (bodyweight reps), `30min` or
/// `30min/5km` (cardio). The name is trimmed.
pub fn parse_exercise_arg(arg: &str) -> Result<ExerciseEntry, ModelError> {
  let (name, sets) = arg
    .split_once('=')
    .ok_or_else(|| ModelError::InvalidSetSpec(arg.to_string()))?;

  let name = name.trim();
  if name.is_empty() {
    return Err(ModelError::EmptyName);
  }

  let sets = sets
    .split(',')
    .map(str::trim)
    .filter(|token| !token.is_empty())
    .map(parse_set_token)
    .collect::<Result<Vec<_>, _>>()?;
  if sets.is_empty() {
    return Err(ModelError::InvalidSetSpec(arg.to_string()));
  }

  Ok(ExerciseEntry::new(name, sets))
}

fn parse_set_token(token: &str) -> Result<WorkoutSet, ModelError> {
  let invalid = || ModelError::InvalidSetSpec(token.to_string());

  let set = if let Some((duration, distance)) = token.split_once('/') {
    let duration = duration.strip_suffix("min").ok_or_else(invalid)?;
    let distance = distance.strip_suffix("km").ok_or_else(invalid)?;
    WorkoutSet::cardio(
      duration.parse().map_err(|_| invalid())?,
      Some(distance.parse().map_err(|_| invalid())?),
    )
  } else if let Some(duration) = token.strip_suffix("min") {
    WorkoutSet::cardio(duration.parse().map_err(|_| invalid())?, None)
  } else if let Some((weight, reps)) = token.split_once(['x', '×']) {
    WorkoutSet::weighted(
      weight.parse().map_err(|_| invalid())?,
      reps.parse().map_err(|_| invalid())?,
    )
  } else {
    WorkoutSet::bodyweight(token.parse().map_err(|_| invalid())?)
  };

  set.validate()?;
  Ok(set)
}

/// ---------------------------------------------------------------------------
/// Workout Logs
/// ---------------------------------------------------------------------------

/// Fields to change on an existing log. Empty `exercises` keeps the current ones;
/// a blank `memo` clears it.
#[derive(Debug, Clone, Default)]
pub struct LogChanges {
  pub date: Option<WorkoutDate>,
  pub exercises: Vec<ExerciseEntry>,
  pub memo: Option<String>,
}

fn normalize_memo(memo: String) -> Option<String> {
  if memo.trim().is_empty() {
    None
  } else {
    Some(memo)
  }
}

pub async fn list_logs(state: &AppState) -> Result<Vec<WorkoutLog>, AppError> {
  db::list_workout_logs(&state.db).await
}

pub async fn add_log(
  state: &AppState,
  date: WorkoutDate,
  exercises: Vec<ExerciseEntry>,
  memo: Option<String>,
) -> Result<WorkoutLog, AppError> {
  let log = NewWorkoutLog {
    date,
    exercises,
    memo: memo.and_then(normalize_memo),
  };
  let id = db::create_workout_log(&state.db, &log).await?;
  info!(id, %date, exercises = log.exercises.len(), "Workout log added");

  db::get_workout_log(&state.db, id).await
}

/// The evaluation is left as is, even when the sets change
pub async fn edit_log(state: &AppState, id: i64, changes: LogChanges) -> Result<WorkoutLog, AppError> {
  let current = db::get_workout_log(&state.db, id).await?;

  let log = NewWorkoutLog {
    date: changes.date.unwrap_or(current.date),
    exercises: if changes.exercises.is_empty() {
      current.exercises
    } else {
      changes.exercises
    },
    memo: match changes.memo {
      Some(memo) => normalize_memo(memo),
      None => current.memo,
    },
  };
  db::update_workout_log(&state.db, id, &log).await?;
  info!(id, date = %log.date, "Workout log updated");

  db::get_workout_log(&state.db, id).await
}

pub async fn delete_log(state: &AppState, id: i64) -> Result<(), AppError> {
  db::delete_workout_log(&state.db, id).await?;
  info!(id, "Workout log deleted");
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Exercise Masters
/// ---------------------------------------------------------------------------

/// Fields to change on a master. Giving any main or sub muscle replaces the
/// whole target list.
#[derive(Debug, Clone, Default)]
pub struct MasterChanges {
  pub name: Option<String>,
  pub kind: Option<ExerciseKind>,
  pub main: Vec<MuscleGroup>,
  pub sub: Vec<MuscleGroup>,
}

fn targets(main: &[MuscleGroup], sub: &[MuscleGroup]) -> Vec<TargetMuscle> {
  main
    .iter()
    .map(|m| TargetMuscle::main(*m))
    .chain(sub.iter().map(|m| TargetMuscle::sub(*m)))
    .collect()
}

fn ensure_unique_name(masters: &[ExerciseMaster], name: &str, except_id: Option<i64>) -> Result<(), ModelError> {
  if masters.iter().any(|m| m.name == name && Some(m.id) != except_id) {
    return Err(ModelError::DuplicateName(name.to_string()));
  }
  Ok(())
}

async fn get_master(state: &AppState, id: i64) -> Result<ExerciseMaster, AppError> {
  db::list_exercise_masters(&state.db)
    .await?
    .into_iter()
    .find(|m| m.id == id)
    .ok_or_else(|| AppError::NotFound(format!("exercise master {}", id)))
}

pub async fn list_masters(state: &AppState) -> Result<Vec<ExerciseMaster>, AppError> {
  db::list_exercise_masters(&state.db).await
}

/// Register an exercise. Without explicit muscles a non-cardio exercise takes
/// the preset targets for its name.
pub async fn add_master(
  state: &AppState,
  name: &str,
  kind: ExerciseKind,
  main: &[MuscleGroup],
  sub: &[MuscleGroup],
) -> Result<ExerciseMaster, AppError> {
  let name = name.trim();
  let masters = db::list_exercise_masters(&state.db).await?;
  ensure_unique_name(&masters, name, None)?;

  let target_muscles = if main.is_empty() && sub.is_empty() && !kind.is_cardio() {
    preset_target_muscles(name)
  } else {
    targets(main, sub)
  };

  let master = NewExerciseMaster {
    name: name.to_string(),
    kind,
    target_muscles,
  };
  let id = db::create_exercise_master(&state.db, &master).await?;
  info!(id, name, kind = kind.as_str(), "Exercise master added");

  get_master(state, id).await
}

/// Renames do not touch logs; entries under the old name stop joining to this master
pub async fn edit_master(state: &AppState, id: i64, changes: MasterChanges) -> Result<ExerciseMaster, AppError> {
  let masters = db::list_exercise_masters(&state.db).await?;
  let current = masters
    .iter()
    .find(|m| m.id == id)
    .ok_or_else(|| AppError::NotFound(format!("exercise master {}", id)))?;

  let name = match &changes.name {
    Some(name) => name.trim().to_string(),
    None => current.name.clone(),
  };
  ensure_unique_name(&masters, &name, Some(id))?;

  let kind = changes.kind.unwrap_or(current.kind);
  let target_muscles = if !changes.main.is_empty() || !changes.sub.is_empty() {
    targets(&changes.main, &changes.sub)
  } else if kind.is_cardio() {
    Vec::new()
  } else {
    current.target_muscles.clone()
  };

  if name != current.name {
    warn!(id, from = %current.name, to = %name, "Renamed exercise; existing logs keep the old name");
  }

  let master = NewExerciseMaster {
    name,
    kind,
    target_muscles,
  };
  db::update_exercise_master(&state.db, id, &master).await?;
  info!(id, name = %master.name, "Exercise master updated");

  get_master(state, id).await
}

pub async fn delete_master(state: &AppState, id: i64) -> Result<(), AppError> {
  db::delete_exercise_master(&state.db, id).await?;
  info!(id, "Exercise master deleted");
  Ok(())
}

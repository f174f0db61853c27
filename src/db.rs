use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::preset_exercises;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::{
  ExerciseEntry, ExerciseKind, ExerciseMaster, NewExerciseMaster, NewWorkoutLog, TargetMuscle,
  WorkoutDate, WorkoutLog,
};

pub type DbPool = SqlitePool;

pub const SETTING_API_KEY: &str = "geminiApiKey";
pub const SETTING_USER_PROFILE: &str = "userProfile";

/// Application state shared by every command
pub struct AppState {
  pub db: DbPool,
  pub config: AppConfig,
}

fn now_millis() -> i64 {
  chrono::Utc::now().timestamp_millis()
}

/// ---------------------------------------------------------------------------
/// Initialization
/// ---------------------------------------------------------------------------

/// Open (creating if needed) the database file and run migrations
pub async fn connect(db_path: &Path) -> Result<DbPool, AppError> {
  if let Some(parent) = db_path.parent() {
    fs::create_dir_all(parent)?;
  }
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}

/// Connect, migrate, and seed preset exercises into an empty store
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, AppError> {
  let pool = connect(&config.database_path).await?;
  let seeded = seed_exercise_masters(&pool).await?;
  info!(seeded, "Database initialized");
  Ok(pool)
}

/// Insert the preset catalog when no masters exist. Returns the number inserted.
pub async fn seed_exercise_masters(pool: &DbPool) -> Result<usize, AppError> {
  let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exercise_masters")
    .fetch_one(pool)
    .await?;
  if count > 0 {
    return Ok(0);
  }

  let presets = preset_exercises();
  let mut tx = pool.begin().await?;
  for preset in &presets {
    insert_master(&mut tx, preset).await?;
  }
  tx.commit().await?;

  Ok(presets.len())
}

/// ---------------------------------------------------------------------------
/// Workout Logs
/// ---------------------------------------------------------------------------

const LOG_COLUMNS: &str =
  "id, date, exercises_json, memo, evaluation, evaluation_generated_at, created_at, updated_at";

fn log_from_row(row: &SqliteRow) -> Result<WorkoutLog, AppError> {
  let date: String = row.try_get("date")?;
  let exercises_json: String = row.try_get("exercises_json")?;
  let exercises: Vec<ExerciseEntry> = serde_json::from_str(&exercises_json)?;

  Ok(WorkoutLog {
    id: row.try_get("id")?,
    date: date.parse::<WorkoutDate>()?,
    exercises,
    memo: row.try_get("memo")?,
    evaluation: row.try_get("evaluation")?,
    evaluation_generated_at: row.try_get("evaluation_generated_at")?,
    created_at: row.try_get("created_at")?,
    updated_at: row.try_get("updated_at")?,
  })
}

fn logs_from_rows(rows: &[SqliteRow]) -> Result<Vec<WorkoutLog>, AppError> {
  rows.iter().map(log_from_row).collect()
}

async fn insert_log(conn: &mut SqliteConnection, log: &NewWorkoutLog) -> Result<i64, AppError> {
  let now = now_millis();
  let result = sqlx::query(
    r#"
    INSERT INTO workout_logs (date, exercises_json, memo, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?4)
    "#,
  )
  .bind(log.date.to_string())
  .bind(serde_json::to_string(&log.exercises)?)
  .bind(&log.memo)
  .bind(now)
  .execute(conn)
  .await?;

  Ok(result.last_insert_rowid())
}

pub async fn create_workout_log(pool: &DbPool, log: &NewWorkoutLog) -> Result<i64, AppError> {
  log.validate()?;
  let mut conn = pool.acquire().await?;
  insert_log(&mut conn, log).await
}

pub async fn update_workout_log(pool: &DbPool, id: i64, log: &NewWorkoutLog) -> Result<(), AppError> {
  log.validate()?;

  let result = sqlx::query(
    r#"
    UPDATE workout_logs SET
      date = ?1,
      exercises_json = ?2,
      memo = ?3,
      updated_at = ?4
    WHERE id = ?5
    "#,
  )
  .bind(log.date.to_string())
  .bind(serde_json::to_string(&log.exercises)?)
  .bind(&log.memo)
  .bind(now_millis())
  .bind(id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("workout log {}", id)));
  }
  Ok(())
}

pub async fn delete_workout_log(pool: &DbPool, id: i64) -> Result<(), AppError> {
  let result = sqlx::query("DELETE FROM workout_logs WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("workout log {}", id)));
  }
  Ok(())
}

pub async fn get_workout_log(pool: &DbPool, id: i64) -> Result<WorkoutLog, AppError> {
  let row = sqlx::query(&format!("SELECT {} FROM workout_logs WHERE id = ?1", LOG_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("workout log {}", id)))?;

  log_from_row(&row)
}

/// Full history, oldest first
pub async fn list_workout_logs(pool: &DbPool) -> Result<Vec<WorkoutLog>, AppError> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM workout_logs ORDER BY date ASC, id ASC",
    LOG_COLUMNS
  ))
  .fetch_all(pool)
  .await?;

  logs_from_rows(&rows)
}

/// Logs with `start <= date <= end`, oldest first
pub async fn list_logs_between(
  pool: &DbPool,
  start: WorkoutDate,
  end: WorkoutDate,
) -> Result<Vec<WorkoutLog>, AppError> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM workout_logs WHERE date >= ?1 AND date <= ?2 ORDER BY date ASC, id ASC",
    LOG_COLUMNS
  ))
  .bind(start.to_string())
  .bind(end.to_string())
  .fetch_all(pool)
  .await?;

  logs_from_rows(&rows)
}

/// Most recent `limit` logs, newest first
pub async fn recent_logs(pool: &DbPool, limit: i64) -> Result<Vec<WorkoutLog>, AppError> {
  let rows = sqlx::query(&format!(
    "SELECT {} FROM workout_logs ORDER BY date DESC, id DESC LIMIT ?1",
    LOG_COLUMNS
  ))
  .bind(limit)
  .fetch_all(pool)
  .await?;

  logs_from_rows(&rows)
}

/// Every date that already has at least one log
pub async fn logged_dates(pool: &DbPool) -> Result<BTreeSet<WorkoutDate>, AppError> {
  let dates: Vec<(String,)> = sqlx::query_as("SELECT DISTINCT date FROM workout_logs")
    .fetch_all(pool)
    .await?;

  dates
    .into_iter()
    .map(|(date,)| date.parse::<WorkoutDate>().map_err(AppError::from))
    .collect()
}

/// Register `masters` and insert `logs` in one transaction, first deleting any
/// existing logs on `replace_dates`. Nothing is written if any step fails.
/// Returns the number of logs inserted.
pub async fn import_workout_logs(
  pool: &DbPool,
  masters: &[NewExerciseMaster],
  logs: &[NewWorkoutLog],
  replace_dates: &BTreeSet<WorkoutDate>,
) -> Result<usize, AppError> {
  for master in masters {
    master.validate()?;
  }
  for log in logs {
    log.validate()?;
  }

  let mut tx = pool.begin().await?;

  for master in masters {
    insert_master(&mut tx, master).await?;
  }

  for date in replace_dates {
    let deleted = sqlx::query("DELETE FROM workout_logs WHERE date = ?1")
      .bind(date.to_string())
      .execute(&mut *tx)
      .await?;
    debug!(%date, rows = deleted.rows_affected(), "Replaced existing logs");
  }

  for log in logs {
    insert_log(&mut tx, log).await?;
  }

  tx.commit().await?;
  Ok(logs.len())
}

pub async fn save_evaluation(pool: &DbPool, id: i64, evaluation: &str) -> Result<(), AppError> {
  let now = now_millis();
  let result = sqlx::query(
    r#"
    UPDATE workout_logs SET
      evaluation = ?1,
      evaluation_generated_at = ?2,
      updated_at = ?2
    WHERE id = ?3
    "#,
  )
  .bind(evaluation)
  .bind(now)
  .bind(id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("workout log {}", id)));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Exercise Masters
/// ---------------------------------------------------------------------------

fn master_from_row(row: &SqliteRow) -> Result<ExerciseMaster, AppError> {
  let kind: String = row.try_get("kind")?;
  let targets_json: String = row.try_get("target_muscles_json")?;
  let target_muscles: Vec<TargetMuscle> = serde_json::from_str(&targets_json)?;

  Ok(ExerciseMaster {
    id: row.try_get("id")?,
    name: row.try_get("name")?,
    kind: kind.parse::<ExerciseKind>()?,
    target_muscles,
    created_at: row.try_get("created_at")?,
  })
}

/// All masters in registration order
pub async fn list_exercise_masters(pool: &DbPool) -> Result<Vec<ExerciseMaster>, AppError> {
  let rows = sqlx::query(
    "SELECT id, name, kind, target_muscles_json, created_at FROM exercise_masters ORDER BY id ASC",
  )
  .fetch_all(pool)
  .await?;

  rows.iter().map(master_from_row).collect()
}

/// `name` is stored exactly as given; it must match the names used in logs
async fn insert_master(conn: &mut SqliteConnection, master: &NewExerciseMaster) -> Result<i64, AppError> {
  let result = sqlx::query(
    r#"
    INSERT INTO exercise_masters (name, kind, target_muscles_json, created_at)
    VALUES (?1, ?2, ?3, ?4)
    "#,
  )
  .bind(&master.name)
  .bind(master.kind.as_str())
  .bind(serde_json::to_string(&master.target_muscles)?)
  .bind(now_millis())
  .execute(conn)
  .await?;

  Ok(result.last_insert_rowid())
}

pub async fn create_exercise_master(
  pool: &DbPool,
  master: &NewExerciseMaster,
) -> Result<i64, AppError> {
  master.validate()?;
  let mut conn = pool.acquire().await?;
  insert_master(&mut conn, master).await
}

pub async fn update_exercise_master(
  pool: &DbPool,
  id: i64,
  master: &NewExerciseMaster,
) -> Result<(), AppError> {
  master.validate()?;

  let result = sqlx::query(
    r#"
    UPDATE exercise_masters SET
      name = ?1,
      kind = ?2,
      target_muscles_json = ?3
    WHERE id = ?4
    "#,
  )
  .bind(&master.name)
  .bind(master.kind.as_str())
  .bind(serde_json::to_string(&master.target_muscles)?)
  .bind(id)
  .execute(pool)
  .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("exercise master {}", id)));
  }
  Ok(())
}

pub async fn delete_exercise_master(pool: &DbPool, id: i64) -> Result<(), AppError> {
  let result = sqlx::query("DELETE FROM exercise_masters WHERE id = ?1")
    .bind(id)
    .execute(pool)
    .await?;

  if result.rows_affected() == 0 {
    return Err(AppError::NotFound(format!("exercise master {}", id)));
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Settings
/// ---------------------------------------------------------------------------

pub async fn get_setting(pool: &DbPool, key: &str) -> Result<Option<String>, AppError> {
  let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_settings WHERE key = ?1")
    .bind(key)
    .fetch_optional(pool)
    .await?;

  Ok(row.map(|(value,)| value).filter(|v| !v.is_empty()))
}

pub async fn set_setting(pool: &DbPool, key: &str, value: &str) -> Result<(), AppError> {
  sqlx::query(
    r#"
    INSERT INTO app_settings (key, value) VALUES (?1, ?2)
    ON CONFLICT(key) DO UPDATE SET value = excluded.value
    "#,
  )
  .bind(key)
  .bind(value)
  .execute(pool)
  .await?;

  Ok(())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::PRESET_COUNT;
  use crate::models::{ModelError, MuscleGroup, WorkoutSet};
  use crate::test_utils::{new_log, setup_test_db, teardown_test_db, weighted_sets};

  #[tokio::test]
  async fn test_seed_only_once() {
    let pool = setup_test_db().await;

    assert_eq!(seed_exercise_masters(&pool).await.unwrap(), PRESET_COUNT);
    assert_eq!(seed_exercise_masters(&pool).await.unwrap(), 0);

    let masters = list_exercise_masters(&pool).await.unwrap();
    assert_eq!(masters.len(), PRESET_COUNT);
    assert_eq!(masters[0].name, "チェストプレス");

    let bench = masters.iter().find(|m| m.name == "ベンチプレス").unwrap();
    assert_eq!(bench.target_muscles[0], TargetMuscle::main(MuscleGroup::Chest));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_log_crud_round_trip() {
    let pool = setup_test_db().await;

    let mut log = new_log("2024-06-12", &[("ベンチプレス", weighted_sets(&[(60.0, 10)]))]);
    log.memo = Some("メモ".to_string());
    let id = create_workout_log(&pool, &log).await.unwrap();

    let stored = get_workout_log(&pool, id).await.unwrap();
    assert_eq!(stored.date, log.date);
    assert_eq!(stored.exercises, log.exercises);
    assert_eq!(stored.memo.as_deref(), Some("メモ"));
    assert_eq!(stored.evaluation, None);

    log.exercises[0].sets.push(WorkoutSet::weighted(65.0, 8));
    update_workout_log(&pool, id, &log).await.unwrap();
    assert_eq!(get_workout_log(&pool, id).await.unwrap().exercises[0].sets.len(), 2);

    delete_workout_log(&pool, id).await.unwrap();
    assert!(matches!(get_workout_log(&pool, id).await, Err(AppError::NotFound(_))));
    assert!(matches!(delete_workout_log(&pool, id).await, Err(AppError::NotFound(_))));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_invalid_log_rejected() {
    let pool = setup_test_db().await;

    let log = new_log("2024-06-12", &[("ベンチプレス", weighted_sets(&[(-5.0, 10)]))]);
    assert!(matches!(
      create_workout_log(&pool, &log).await,
      Err(AppError::Validation(_))
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_log_queries_ordering() {
    let pool = setup_test_db().await;

    for date in ["2024-06-10", "2024-06-01", "2024-06-20", "2024-06-15"] {
      create_workout_log(&pool, &new_log(date, &[("スクワット", weighted_sets(&[(80.0, 5)]))]))
        .await
        .unwrap();
    }

    let all = list_workout_logs(&pool).await.unwrap();
    let dates: Vec<String> = all.iter().map(|l| l.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-06-01", "2024-06-10", "2024-06-15", "2024-06-20"]);

    let between = list_logs_between(&pool, "2024-06-10".parse().unwrap(), "2024-06-15".parse().unwrap())
      .await
      .unwrap();
    assert_eq!(between.len(), 2);

    let recent = recent_logs(&pool, 2).await.unwrap();
    assert_eq!(recent[0].date.to_string(), "2024-06-20");
    assert_eq!(recent[1].date.to_string(), "2024-06-15");

    assert_eq!(logged_dates(&pool).await.unwrap().len(), 4);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_import_replaces_dates() {
    let pool = setup_test_db().await;

    create_workout_log(&pool, &new_log("2024-06-10", &[("スクワット", weighted_sets(&[(80.0, 5)]))]))
      .await
      .unwrap();
    create_workout_log(&pool, &new_log("2024-06-11", &[("スクワット", weighted_sets(&[(85.0, 5)]))]))
      .await
      .unwrap();

    let imported = vec![new_log("2024-06-10", &[("ベンチプレス", weighted_sets(&[(60.0, 10)]))])];
    let replace: BTreeSet<WorkoutDate> = ["2024-06-10".parse().unwrap()].into_iter().collect();
    assert_eq!(import_workout_logs(&pool, &[], &imported, &replace).await.unwrap(), 1);

    let all = list_workout_logs(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].exercises[0].name, "ベンチプレス");
    assert_eq!(all[1].exercises[0].name, "スクワット");

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_failed_import_rolls_back_masters_and_logs() {
    let pool = setup_test_db().await;

    let existing = NewExerciseMaster {
      name: "ベンチプレス".to_string(),
      kind: ExerciseKind::Weighted,
      target_muscles: vec![],
    };
    create_exercise_master(&pool, &existing).await.unwrap();

    let fresh = NewExerciseMaster {
      name: "ケーブルクロス".to_string(),
      ..existing.clone()
    };
    let logs = vec![new_log("2024-06-10", &[("ケーブルクロス", weighted_sets(&[(20.0, 12)]))])];

    // Second master collides on UNIQUE(name) after the first was inserted
    let result = import_workout_logs(&pool, &[fresh, existing], &logs, &BTreeSet::new()).await;
    assert!(matches!(result, Err(AppError::Database(_))));

    let masters = list_exercise_masters(&pool).await.unwrap();
    assert_eq!(masters.len(), 1);
    assert_eq!(masters[0].name, "ベンチプレス");
    assert!(list_workout_logs(&pool).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_padded_names_rejected() {
    let pool = setup_test_db().await;

    let master = NewExerciseMaster {
      name: "ベンチプレス ".to_string(),
      kind: ExerciseKind::Weighted,
      target_muscles: vec![],
    };
    assert!(matches!(
      create_exercise_master(&pool, &master).await,
      Err(AppError::Validation(ModelError::UntrimmedName(_)))
    ));

    let log = new_log("2024-06-12", &[(" スクワット", weighted_sets(&[(80.0, 5)]))]);
    assert!(matches!(
      create_workout_log(&pool, &log).await,
      Err(AppError::Validation(ModelError::UntrimmedName(_)))
    ));

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_save_evaluation() {
    let pool = setup_test_db().await;
    let id = create_workout_log(&pool, &new_log("2024-06-12", &[("スクワット", weighted_sets(&[(80.0, 5)]))]))
      .await
      .unwrap();

    save_evaluation(&pool, id, "いい感じです💪").await.unwrap();
    let log = get_workout_log(&pool, id).await.unwrap();
    assert_eq!(log.evaluation.as_deref(), Some("いい感じです💪"));
    assert!(log.evaluation_generated_at.is_some());

    assert!(matches!(save_evaluation(&pool, 999, "x").await, Err(AppError::NotFound(_))));
    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_master_crud_and_unique_name() {
    let pool = setup_test_db().await;

    let master = NewExerciseMaster {
      name: "ブルガリアンスクワット".to_string(),
      kind: ExerciseKind::Weighted,
      target_muscles: vec![TargetMuscle::main(MuscleGroup::Quadriceps)],
    };
    let id = create_exercise_master(&pool, &master).await.unwrap();
    assert!(matches!(
      create_exercise_master(&pool, &master).await,
      Err(AppError::Database(_))
    ));

    let updated = NewExerciseMaster {
      kind: ExerciseKind::Bodyweight,
      ..master
    };
    update_exercise_master(&pool, id, &updated).await.unwrap();
    let masters = list_exercise_masters(&pool).await.unwrap();
    assert!(masters[0].is_bodyweight());

    delete_exercise_master(&pool, id).await.unwrap();
    assert!(list_exercise_masters(&pool).await.unwrap().is_empty());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_settings_upsert() {
    let pool = setup_test_db().await;

    assert_eq!(get_setting(&pool, SETTING_USER_PROFILE).await.unwrap(), None);
    set_setting(&pool, SETTING_USER_PROFILE, "初心者").await.unwrap();
    set_setting(&pool, SETTING_USER_PROFILE, "中級者").await.unwrap();
    assert_eq!(
      get_setting(&pool, SETTING_USER_PROFILE).await.unwrap().as_deref(),
      Some("中級者")
    );

    teardown_test_db(pool).await;
  }
}

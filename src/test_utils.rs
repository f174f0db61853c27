//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Helper assertions

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::db::AppState;
use crate::models::{
  ExerciseEntry, ExerciseKind, ExerciseMaster, NewWorkoutLog, TargetMuscle, WorkoutDate,
  WorkoutLog, WorkoutSet,
};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over a fresh in-memory database. No API key is configured;
/// Gemini requests go to `api_base`.
pub async fn setup_test_state(api_base: &str) -> AppState {
  AppState {
    db: setup_test_db().await,
    config: AppConfig {
      database_path: PathBuf::from(":memory:"),
      gemini_api_key: None,
      gemini_model: crate::llm::DEFAULT_MODEL.to_string(),
      gemini_api_base: api_base.to_string(),
      log_level: "debug".to_string(),
    },
  }
}

/// Insert each log through the repository. Returns the new ids.
pub async fn seed_test_logs(pool: &SqlitePool, logs: &[NewWorkoutLog]) -> Vec<i64> {
  let mut ids = Vec::new();
  for log in logs {
    let id = crate::db::create_workout_log(pool, log)
      .await
      .expect("Failed to insert test log");
    ids.push(id);
  }
  ids
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("bad test date")
}

/// `YYYY-MM-DD` of the day `days` before `today`
pub fn days_ago(today: NaiveDate, days: i64) -> String {
  (today - Duration::days(days)).format("%Y-%m-%d").to_string()
}

pub fn weighted_sets(sets: &[(f64, u32)]) -> Vec<WorkoutSet> {
  sets
    .iter()
    .map(|&(weight, reps)| WorkoutSet::weighted(weight, reps))
    .collect()
}

pub fn mock_master(name: &str, kind: ExerciseKind, target_muscles: Vec<TargetMuscle>) -> ExerciseMaster {
  ExerciseMaster {
    id: 0,
    name: name.to_string(),
    kind,
    target_muscles,
    created_at: 0,
  }
}

fn entries(exercises: &[(&str, Vec<WorkoutSet>)]) -> Vec<ExerciseEntry> {
  exercises
    .iter()
    .map(|(name, sets)| ExerciseEntry::new(*name, sets.clone()))
    .collect()
}

/// A stored log with no memo or evaluation
pub fn mock_log(date_str: &str, exercises: &[(&str, Vec<WorkoutSet>)]) -> WorkoutLog {
  WorkoutLog {
    id: 0,
    date: date_str.parse::<WorkoutDate>().expect("bad test date"),
    exercises: entries(exercises),
    memo: None,
    evaluation: None,
    evaluation_generated_at: None,
    created_at: 0,
    updated_at: 0,
  }
}

/// An unsaved log, ready for `db::create_workout_log`
pub fn new_log(date_str: &str, exercises: &[(&str, Vec<WorkoutSet>)]) -> NewWorkoutLog {
  NewWorkoutLog {
    date: date_str.parse::<WorkoutDate>().expect("bad test date"),
    exercises: entries(exercises),
    memo: None,
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workout_logs', 'exercise_masters', 'app_settings')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 3);

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_logs_returns_ids() {
    let pool = setup_test_db().await;

    let ids = seed_test_logs(
      &pool,
      &[
        new_log("2024-06-10", &[("スクワット", weighted_sets(&[(80.0, 5)]))]),
        new_log("2024-06-12", &[("スクワット", weighted_sets(&[(82.5, 5)]))]),
      ],
    )
    .await;
    assert_eq!(ids.len(), 2);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workout_logs")
      .fetch_one(&pool)
      .await
      .expect("Failed to count logs");
    assert_eq!(count, 2);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_days_ago() {
    assert_eq!(days_ago(date("2024-03-01"), 1), "2024-02-29");
    assert_eq!(days_ago(date("2024-06-19"), 0), "2024-06-19");
  }
}

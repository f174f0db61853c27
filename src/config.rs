//! Environment configuration
//!
//! Values come from the process environment, optionally seeded from a `.env`
//! file by `dotenvy` before `AppConfig::from_env` runs.

use std::env;
use std::path::PathBuf;

use crate::error::AppError;
use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL};

const DB_FILE_NAME: &str = "training-log.db";
const APP_DIR_NAME: &str = "training-log";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_path: PathBuf,
  pub gemini_api_key: Option<String>,
  pub gemini_model: String,
  pub gemini_api_base: String,
  pub log_level: String,
}

fn non_empty_var(key: &str) -> Option<String> {
  env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `<platform data dir>/training-log/training-log.db`
fn default_database_path() -> Result<PathBuf, AppError> {
  let data_dir = dirs::data_dir()
    .ok_or_else(|| AppError::Config("Could not determine platform data directory".into()))?;
  Ok(data_dir.join(APP_DIR_NAME).join(DB_FILE_NAME))
}

impl AppConfig {
  pub fn from_env() -> Result<Self, AppError> {
    let database_path = match non_empty_var("TRAINING_LOG_DB") {
      Some(path) => PathBuf::from(path),
      None => default_database_path()?,
    };

    Ok(Self {
      database_path,
      gemini_api_key: non_empty_var("GEMINI_API_KEY"),
      gemini_model: non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
      gemini_api_base: non_empty_var("GEMINI_API_BASE")
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
      log_level: non_empty_var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
    })
  }
}

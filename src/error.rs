use thiserror::Error;

use crate::llm::LlmError;
use crate::models::ModelError;

/// Errors surfaced by commands and the store
#[derive(Error, Debug)]
pub enum AppError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error(transparent)]
  Llm(#[from] LlmError),

  #[error(transparent)]
  Validation(#[from] ModelError),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Not found: {0}")]
  NotFound(String),

  #[error("Configuration error: {0}")]
  Config(String),
}

pub mod calendar;
pub mod catalog;
pub mod chart;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod markdown;
pub mod metrics;
pub mod models;
pub mod periodization;
pub mod progress;
pub mod prompt;
pub mod stagnation;
pub mod volume;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use tracing::info;

use commands::Cli;
use config::AppConfig;
use db::AppState;
use error::AppError;

pub async fn run() -> Result<(), AppError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  let config = AppConfig::from_env()?;
  logging::init(&config.log_level);

  let db = db::initialize_db(&config).await?;
  info!("Database ready");

  let state = AppState { db, config };
  let result = commands::dispatch(&state, cli.command).await;
  state.db.close().await;
  result
}

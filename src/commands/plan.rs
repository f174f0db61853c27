use chrono::NaiveDate;
use tracing::info;

use crate::db::{self, AppState, SETTING_API_KEY, SETTING_USER_PROFILE};
use crate::error::AppError;
use crate::llm::{GeminiClient, GeneratedPlan};
use crate::models::{ExerciseMaster, WorkoutLog};
use crate::periodization::generate_deload_suggestion;
use crate::prompt::{build_evaluation_prompt, build_plan_prompt, select_previous_logs, PlanAnalytics, HISTORY_LIMIT};
use crate::stagnation::detect_stagnation;
use crate::volume::calculate_weekly_volume;

/// Resolve the API key (environment, then stored setting) and build a client
pub async fn gemini_client(state: &AppState) -> Result<GeminiClient, AppError> {
  let stored_key = db::get_setting(&state.db, SETTING_API_KEY).await?;
  Ok(GeminiClient::from_config(&state.config, stored_key)?)
}

/// Run every analytic the plan prompt embeds
pub fn plan_analytics(logs: &[WorkoutLog], masters: &[ExerciseMaster], today: NaiveDate) -> PlanAnalytics {
  PlanAnalytics {
    stagnation: detect_stagnation(logs, masters),
    deload: generate_deload_suggestion(logs, masters, today),
    volume: calculate_weekly_volume(logs, masters, today),
  }
}

pub async fn generate_plan(
  state: &AppState,
  client: &GeminiClient,
  memo: &str,
  today: NaiveDate,
) -> Result<GeneratedPlan, AppError> {
  let masters = db::list_exercise_masters(&state.db).await?;
  let logs = db::list_workout_logs(&state.db).await?;
  let recent = db::recent_logs(&state.db, HISTORY_LIMIT as i64).await?;
  let profile = db::get_setting(&state.db, SETTING_USER_PROFILE).await?;

  let analytics = plan_analytics(&logs, &masters, today);
  let prompt = build_plan_prompt(profile.as_deref(), &masters, &recent, memo, &analytics);

  let plan = client.generate_plan(&prompt).await?;
  info!(exercises = plan.exercises.len(), "Plan generated");
  Ok(plan)
}

/// Generate feedback for one log and store it on the log
pub async fn evaluate_workout(state: &AppState, client: &GeminiClient, log_id: i64) -> Result<String, AppError> {
  let log = db::get_workout_log(&state.db, log_id).await?;
  let profile = db::get_setting(&state.db, SETTING_USER_PROFILE).await?;

  let mut history = db::list_workout_logs(&state.db).await?;
  history.reverse();
  let previous = select_previous_logs(&history, &log);

  let prompt = build_evaluation_prompt(profile.as_deref(), &log, &previous);
  let evaluation = client.evaluate_workout(&prompt).await?;

  db::save_evaluation(&state.db, log_id, &evaluation).await?;
  info!(log_id, previous = previous.len(), "Evaluation saved");
  Ok(evaluation)
}

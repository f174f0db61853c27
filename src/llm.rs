//! LLM integration for plan generation and workout evaluation
//!
//! This module handles communication with the Gemini `generateContent` API.
//! Prompts are assembled in `prompt`; this module only sends them and turns
//! the response text into typed results.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::AppConfig;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const TEMPERATURE: f64 = 0.7;
pub const PLAN_MAX_TOKENS: u32 = 2048;
pub const EVALUATION_MAX_TOKENS: u32 = 1024;

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum LlmError {
  #[error("API key not configured")]
  MissingApiKey,

  #[error("Request failed: {0}")]
  Request(String),

  #[error("API error: {0}")]
  Api(String),

  #[error("Empty response from API")]
  EmptyResponse,

  #[error("Parse error: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// Gemini API Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
  text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f64,
  max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
  content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
  error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
  message: String,
}

/// ---------------------------------------------------------------------------
/// Generated Plan
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedSet {
  pub weight: f64,
  pub reps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
  pub name: String,
  pub sets: Vec<PlannedSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPlan {
  pub exercises: Vec<PlannedExercise>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub advice: Option<String>,
}

/// Numbers may come back as JSON numbers or numeric strings; anything else is 0
fn lenient_number(value: Option<&Value>) -> f64 {
  let number = match value {
    Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
    Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
    _ => 0.0,
  };
  number.max(0.0)
}

impl GeneratedPlan {
  /// Parse model output into a plan. Requires an `exercises` array; missing
  /// names become empty strings and missing numbers become 0.
  pub fn from_response(text: &str) -> Result<Self, LlmError> {
    let json_str = extract_json(text)?;
    let parsed: Value =
      serde_json::from_str(&json_str).map_err(|e| LlmError::Parse(format!("{}: {}", e, json_str)))?;

    let exercises = parsed
      .get("exercises")
      .and_then(Value::as_array)
      .ok_or_else(|| LlmError::Parse("exercises array not found".to_string()))?;

    let exercises = exercises
      .iter()
      .map(|ex| PlannedExercise {
        name: ex
          .get("name")
          .and_then(Value::as_str)
          .unwrap_or_default()
          .to_string(),
        sets: ex
          .get("sets")
          .and_then(Value::as_array)
          .map(|sets| {
            sets
              .iter()
              .map(|s| PlannedSet {
                weight: lenient_number(s.get("weight")),
                reps: lenient_number(s.get("reps")) as u32,
              })
              .collect()
          })
          .unwrap_or_default(),
      })
      .collect();

    let advice = parsed
      .get("advice")
      .and_then(Value::as_str)
      .filter(|a| !a.is_empty())
      .map(str::to_string);

    Ok(Self { exercises, advice })
  }
}

/// ---------------------------------------------------------------------------
/// Gemini Client
/// ---------------------------------------------------------------------------

pub struct GeminiClient {
  client: Client,
  api_key: String,
  endpoint: Url,
}

impl GeminiClient {
  pub fn new(api_key: impl Into<String>, api_base: &str, model: &str) -> Result<Self, LlmError> {
    let api_key = api_key.into();
    if api_key.trim().is_empty() {
      return Err(LlmError::MissingApiKey);
    }

    let endpoint = Url::parse(api_base)
      .and_then(|base| base.join(&format!("/v1beta/models/{}:generateContent", model)))
      .map_err(|e| LlmError::Request(format!("Invalid API base {}: {}", api_base, e)))?;

    Ok(Self {
      client: Client::new(),
      api_key,
      endpoint,
    })
  }

  /// Build a client from config. `GEMINI_API_KEY` wins over a key stored in
  /// the settings table.
  pub fn from_config(config: &AppConfig, stored_key: Option<String>) -> Result<Self, LlmError> {
    let api_key = config
      .gemini_api_key
      .clone()
      .or(stored_key)
      .ok_or(LlmError::MissingApiKey)?;

    Self::new(api_key, &config.gemini_api_base, &config.gemini_model)
  }

  /// Send a single-turn prompt and return the first candidate's text
  pub async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
    let request = GenerateRequest {
      contents: vec![Content {
        parts: vec![Part {
          text: Some(prompt.to_string()),
        }],
      }],
      generation_config: GenerationConfig {
        temperature: TEMPERATURE,
        max_output_tokens: max_tokens,
      },
    };

    info!(endpoint = %self.endpoint, max_tokens, "Calling Gemini");

    let response = self
      .client
      .post(self.endpoint.clone())
      .query(&[("key", &self.api_key)])
      .header("content-type", "application/json")
      .json(&request)
      .send()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| LlmError::Request(e.to_string()))?;

    if !status.is_success() {
      if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
        return Err(LlmError::Api(error_resp.error.message));
      }
      return Err(LlmError::Api(format!("HTTP {}", status)));
    }

    let parsed: GenerateResponse =
      serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

    let text = parsed
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content)
      .and_then(|c| c.parts.into_iter().next())
      .and_then(|p| p.text)
      .filter(|t| !t.is_empty())
      .ok_or(LlmError::EmptyResponse)?;

    debug!(chars = text.len(), "Gemini response received");
    Ok(text)
  }

  pub async fn generate_plan(&self, prompt: &str) -> Result<GeneratedPlan, LlmError> {
    let text = self.generate(prompt, PLAN_MAX_TOKENS).await?;
    GeneratedPlan::from_response(&text)
  }

  /// Free-text feedback on a single workout
  pub async fn evaluate_workout(&self, prompt: &str) -> Result<String, LlmError> {
    self.generate(prompt, EVALUATION_MAX_TOKENS).await
  }
}

/// Extract JSON from model output (handles markdown code blocks)
fn extract_json(text: &str) -> Result<String, LlmError> {
  let trimmed = text.trim();
  if trimmed.starts_with('{') {
    return Ok(trimmed.to_string());
  }

  // Fenced block, with or without a language tag
  if let Some(start) = text.find("```") {
    let after_fence = start + 3;
    let content_start = text[after_fence..]
      .find('\n')
      .map(|i| after_fence + i + 1)
      .unwrap_or(after_fence);
    if let Some(end) = text[content_start..].find("```") {
      return Ok(text[content_start..content_start + end].trim().to_string());
    }
  }

  if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
    if start < end {
      return Ok(text[start..=end].to_string());
    }
  }

  Err(LlmError::Parse("Could not extract JSON from response".to_string()))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::Matcher;
  use serde_json::json;

  const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash:generateContent";

  fn text_response(text: &str) -> String {
    json!({
      "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
    .to_string()
  }

  #[test]
  fn test_extract_json_direct() {
    let input = r#"{"exercises": []}"#;
    assert_eq!(extract_json(input).unwrap(), input);
  }

  #[test]
  fn test_extract_json_code_block() {
    let input = "今日のプランです:\n\n```json\n{\"exercises\": []}\n```\n\n頑張ってください";
    assert_eq!(extract_json(input).unwrap(), r#"{"exercises": []}"#);
  }

  #[test]
  fn test_extract_json_fallback() {
    let input = r#"プラン: {"exercises": []} 以上"#;
    assert_eq!(extract_json(input).unwrap(), r#"{"exercises": []}"#);
  }

  #[test]
  fn test_extract_json_none() {
    assert!(matches!(extract_json("no json here"), Err(LlmError::Parse(_))));
  }

  #[test]
  fn test_plan_parse_lenient_fields() {
    let text = r#"{
      "exercises": [
        { "name": "ベンチプレス", "sets": [{ "weight": 60, "reps": 10 }, { "weight": "62.5", "reps": "8" }] },
        { "name": "ディップス", "sets": [{ "reps": 12 }] },
        { "sets": [] }
      ],
      "advice": "フォーム重視で"
    }"#;

    let plan = GeneratedPlan::from_response(text).unwrap();
    assert_eq!(plan.exercises.len(), 3);
    assert_eq!(plan.exercises[0].sets[1], PlannedSet { weight: 62.5, reps: 8 });
    assert_eq!(plan.exercises[1].sets[0], PlannedSet { weight: 0.0, reps: 12 });
    assert_eq!(plan.exercises[2].name, "");
    assert_eq!(plan.advice.as_deref(), Some("フォーム重視で"));
  }

  #[test]
  fn test_plan_requires_exercises_array() {
    let result = GeneratedPlan::from_response(r#"{"advice": "休みましょう"}"#);
    assert!(matches!(result, Err(LlmError::Parse(_))));

    let result = GeneratedPlan::from_response(r#"{"exercises": "none"}"#);
    assert!(matches!(result, Err(LlmError::Parse(_))));
  }

  #[test]
  fn test_missing_api_key() {
    assert!(matches!(
      GeminiClient::new("", DEFAULT_API_BASE, DEFAULT_MODEL),
      Err(LlmError::MissingApiKey)
    ));
  }

  #[tokio::test]
  async fn test_generate_sends_prompt_and_config() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", GENERATE_PATH)
      .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
      .match_body(Matcher::PartialJson(json!({
        "contents": [{ "parts": [{ "text": "こんにちは" }] }],
        "generationConfig": { "temperature": 0.7, "maxOutputTokens": 1024 }
      })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(text_response("良いトレーニングでした"))
      .create_async()
      .await;

    let client = GeminiClient::new("test-key", &server.url(), DEFAULT_MODEL).unwrap();
    let text = client.evaluate_workout("こんにちは").await.unwrap();

    assert_eq!(text, "良いトレーニングでした");
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_generate_plan_from_fenced_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", GENERATE_PATH)
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(text_response(
        "```json\n{\"exercises\": [{\"name\": \"スクワット\", \"sets\": [{\"weight\": 80, \"reps\": 5}]}]}\n```",
      ))
      .create_async()
      .await;

    let client = GeminiClient::new("test-key", &server.url(), DEFAULT_MODEL).unwrap();
    let plan = client.generate_plan("plan").await.unwrap();

    assert_eq!(plan.exercises[0].name, "スクワット");
    assert_eq!(plan.exercises[0].sets, vec![PlannedSet { weight: 80.0, reps: 5 }]);
    assert_eq!(plan.advice, None);
  }

  #[tokio::test]
  async fn test_api_error_message_surfaces() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", GENERATE_PATH)
      .match_query(Matcher::Any)
      .with_status(400)
      .with_body(r#"{"error": {"code": 400, "message": "API key not valid"}}"#)
      .create_async()
      .await;

    let client = GeminiClient::new("bad-key", &server.url(), DEFAULT_MODEL).unwrap();
    match client.generate("x", 10).await {
      Err(LlmError::Api(message)) => assert_eq!(message, "API key not valid"),
      other => panic!("expected API error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_api_error_without_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", GENERATE_PATH)
      .match_query(Matcher::Any)
      .with_status(500)
      .create_async()
      .await;

    let client = GeminiClient::new("k", &server.url(), DEFAULT_MODEL).unwrap();
    match client.generate("x", 10).await {
      Err(LlmError::Api(message)) => assert!(message.contains("500")),
      other => panic!("expected API error, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_empty_candidates_is_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", GENERATE_PATH)
      .match_query(Matcher::Any)
      .with_status(200)
      .with_body(r#"{"candidates": []}"#)
      .create_async()
      .await;

    let client = GeminiClient::new("k", &server.url(), DEFAULT_MODEL).unwrap();
    assert!(matches!(client.generate("x", 10).await, Err(LlmError::EmptyResponse)));
  }
}

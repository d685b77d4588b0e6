//! Generative Language API adapter.
//!
//! # Responsibility
//! - Ask the provider for structured JSON seeds and analyses.
//! - Map provider failures onto [`OracleError`].
//!
//! # Invariants
//! - One HTTP request per call; retries are the caller's concern (there are none).
//! - A successful but empty answer decodes to the empty-response defaults
//!   instead of failing.

use super::{OracleError, OracleResult, RitualOracle};
use crate::config::OracleConfig;
use crate::model::ritual::{Analysis, Seed};
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const SEED_INSTRUCTION: &str =
    "Generate a short, poetic, and mindful writing prompt for a daily ritual. Keep it under 20 words.";
const MAX_ERROR_BODY_CHARS: usize = 500;

fn empty_response_seed() -> Seed {
    Seed::new("Let the words flow like water.", "Serenity")
}

fn empty_response_analysis() -> Analysis {
    Analysis::new("A ripple in the pond of thought.", "Reflective")
}

/// Oracle backed by the `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiOracle {
    api_key: Option<String>,
    model: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl GeminiOracle {
    /// Builds an adapter with the configured timeout.
    pub fn from_config(config: &OracleConfig) -> OracleResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            api_key: config
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn generate<T: DeserializeOwned>(
        &self,
        instruction: String,
        schema: Value,
        empty_default: T,
    ) -> OracleResult<T> {
        let api_key = self.api_key.as_deref().ok_or(OracleError::MissingApiKey)?;
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: instruction }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let payload: GenerateResponse = response.json().await?;
        let text = response_text(&payload);
        debug!(
            "event=oracle_response module=oracle status=ok model={} text_chars={}",
            self.model,
            text.chars().count()
        );
        decode_structured(&text, empty_default)
    }
}

#[async_trait]
impl RitualOracle for GeminiOracle {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn fetch_seed(&self) -> OracleResult<Seed> {
        self.generate(
            SEED_INSTRUCTION.to_string(),
            object_schema(&["prompt", "theme"]),
            empty_response_seed(),
        )
        .await
    }

    async fn analyze(&self, text: &str) -> OracleResult<Analysis> {
        self.generate(
            analysis_instruction(text),
            object_schema(&["summary", "mood"]),
            empty_response_analysis(),
        )
        .await
    }
}

fn analysis_instruction(text: &str) -> String {
    format!(
        "Analyze this personal reflection and provide a one-sentence poetic summary and a single word representing the mood: \"{text}\""
    )
}

/// Response schema for an object whose listed fields are required strings.
fn object_schema(fields: &[&str]) -> Value {
    let properties = fields
        .iter()
        .map(|field| ((*field).to_string(), json!({ "type": "STRING" })))
        .collect::<serde_json::Map<_, _>>();
    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": fields,
    })
}

/// Concatenates the text parts of the first candidate.
fn response_text(payload: &GenerateResponse) -> String {
    payload
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn decode_structured<T: DeserializeOwned>(text: &str, empty_default: T) -> OracleResult<T> {
    if text.trim().is_empty() {
        return Ok(empty_default);
    }
    Ok(serde_json::from_str(text)?)
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

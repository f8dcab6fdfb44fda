//! Client for the Gemini `generateContent` endpoint.
//!
//! Each call is stateless: the [`CoachConfig`] passed in selects the system
//! instruction, so switching mode or language never leaks into other requests.

use crate::coach::{system_instruction, CoachConfig, Language};
use crate::feedback::{FeedbackError, FeedbackRequester};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const TEMPERATURE: f32 = 0.7;
const MAX_RETRIES: u32 = 2;

/// Environment variables checked, in order, for the API key.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn build_request<'a>(instruction: &'a str, message: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part { text: instruction }],
        },
        contents: vec![Content {
            role: Some("user"),
            parts: vec![Part { text: message }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
        },
    }
}

fn is_retriable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        api_base: &str,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, FeedbackError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// First non-empty key from [`API_KEY_VARS`].
    pub fn api_key_from_env() -> Option<String> {
        API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|key| !key.trim().is_empty())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }

    /// One request under `config`. Retries on 429, 5xx and transport failures.
    pub fn generate(&self, config: &CoachConfig, message: &str) -> Result<String, FeedbackError> {
        let instruction = system_instruction(config);
        let body = build_request(&instruction, message);
        let mut last_error: Option<FeedbackError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(attempt, ?delay, "gemini call failed, retrying");
                std::thread::sleep(delay);
            }

            let response = self
                .client
                .post(self.endpoint())
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send();

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_error = Some(FeedbackError::Http(e));
                    continue;
                }
                Err(e) => return Err(FeedbackError::Http(e)),
            };

            let status = response.status();
            if is_retriable(status) {
                let message = response.text().unwrap_or_default();
                last_error = Some(FeedbackError::Api {
                    status: status.as_u16(),
                    message,
                });
                continue;
            }

            if !status.is_success() {
                let raw = response.text().unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&raw)
                    .map(|e| e.error.message)
                    .unwrap_or(raw);
                return Err(FeedbackError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: GenerateResponse = serde_json::from_str(&response.text()?)?;
            debug!(mode = %config.mode, language = %config.language, "gemini call succeeded");
            return parsed.text().ok_or(FeedbackError::EmptyContent);
        }

        Err(last_error.unwrap_or(FeedbackError::EmptyContent))
    }
}

/// Typing feedback in a fixed language, backed by Gemini.
#[derive(Debug, Clone)]
pub struct GeminiFeedback {
    client: GeminiClient,
    config: CoachConfig,
}

impl GeminiFeedback {
    pub fn new(client: GeminiClient, language: Language) -> Self {
        Self {
            client,
            config: CoachConfig::typing(language),
        }
    }
}

impl FeedbackRequester for GeminiFeedback {
    fn request_feedback(&self, summary: &str) -> Result<String, FeedbackError> {
        self.client.generate(&self.config, summary)
    }
}

//! Google Gemini `generateContent` transport.

use std::time::Duration;

use async_trait::async_trait;
use catalog::{ConfigError, GenerationError, GenerationRequest, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Public Gemini API host.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Request timeout. Generating labels for a full batch of 500 books takes a
/// while on the larger models.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Connection settings for [`GeminiProvider`].
#[derive(Clone)]
pub struct GeminiConfig {
    /// Scheme and host, without a trailing path. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,
    /// API key sent in the `x-goog-api-key` header.
    pub api_key: String,
    /// Whole-request timeout. Default: [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Settings for the public endpoint with the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Rejects an empty key or base URL and a zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::new("Gemini API key is empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::new("Gemini base URL is empty"));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::new("Gemini request timeout must be non-zero"));
        }
        Ok(())
    }
}

impl Default for GeminiConfig {
    /// The public endpoint with a five minute timeout and no key. A key must
    /// be filled in before the config passes [`GeminiConfig::validate`].
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// [`TextGenerator`] backed by the Gemini REST API.
pub struct GeminiProvider {
    http: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Builds the HTTP client, rejecting an invalid `config`.
    pub fn new(config: GeminiConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::new(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = self.endpoint(request.model.as_str());
        debug!(url = %url, prompt_chars = request.prompt.len(), "Calling generateContent");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateContentRequest::from(request))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(transport)?;
        parsed.into_text()
    }
}

fn transport(err: reqwest::Error) -> GenerationError {
    GenerationError::Transport {
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    candidate_count: u32,
    response_mime_type: &'a str,
    temperature: f32,
}

impl<'a> From<&'a GenerationRequest> for GenerateContentRequest<'a> {
    fn from(request: &'a GenerationRequest) -> Self {
        Self {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                candidate_count: request.candidate_count,
                response_mime_type: &request.response_mime_type,
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    fn into_text(self) -> Result<String, GenerationError> {
        let candidate = self.candidates.into_iter().next();
        let finish_reason = candidate.as_ref().and_then(|c| c.finish_reason.clone());

        let text: String = candidate
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(text);
        }

        let block_reason = self.prompt_feedback.and_then(|f| f.block_reason);
        warn!(
            block_reason = block_reason.as_deref().unwrap_or("none"),
            finish_reason = finish_reason.as_deref().unwrap_or("none"),
            "No content in response"
        );
        Err(GenerationError::EmptyResponse { block_reason })
    }
}

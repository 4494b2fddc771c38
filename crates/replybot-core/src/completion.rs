//! Text completion using the OpenAI completions API.
//!
//! Provides the blocking [`CompletionClient`] used by the reply
//! orchestrator, plus the request/response types shared with test doubles.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::traits::TextGenerator;

/// Environment variable holding the API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the API base URL.
pub const OPENAI_BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Path of the completions endpoint.
const COMPLETIONS_PATH: &str = "/v1/completions";

/// Errors that can occur during generation.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// API key not set in environment.
    #[error("OpenAI API key not set. Set OPENAI_API_KEY environment variable.")]
    NoApiKey,

    /// API request failed.
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// API returned an error status.
    #[error("API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Response body was not JSON.
    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

/// Sampling parameters for reply generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Maximum tokens in the reply.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Number of candidates.
    pub n: u32,
    /// Stop sequences; a newline caps the reply at one paragraph.
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 50,
            temperature: 0.5,
            top_p: 1.0,
            n: 1,
            stop: vec!["\n".to_string()],
        }
    }
}

/// A single completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Model identifier.
    pub model: String,
    /// Prompt text.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// Number of candidates.
    pub n: u32,
    /// Streaming is never used.
    pub stream: bool,
    /// Log probabilities are never requested.
    pub logprobs: Option<u32>,
    /// Stop sequences.
    pub stop: Vec<String>,
}

impl GenerationRequest {
    /// Builds a request for `model` and `prompt` with the given parameters.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>, params: &GenerationParams) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
            n: params.n,
            stream: false,
            logprobs: None,
            stop: params.stop.clone(),
        }
    }
}

/// Completion response.
///
/// Every field is optional on the wire; a response that parses but carries
/// no text is a malformed generation, not a transport error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionResponse {
    /// Response id.
    #[serde(default)]
    pub id: Option<String>,
    /// Generated candidates.
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    /// Token accounting.
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

/// One generated candidate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionChoice {
    /// Generated text.
    #[serde(default)]
    pub text: Option<String>,
    /// Candidate index.
    #[serde(default)]
    pub index: Option<u32>,
    /// Why generation stopped.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompletionUsage {
    /// Prompt tokens.
    #[serde(default)]
    pub prompt_tokens: u32,
    /// Generated tokens.
    #[serde(default)]
    pub completion_tokens: u32,
    /// Total tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

impl CompletionResponse {
    /// Creates a response with a single candidate.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![CompletionChoice {
                text: Some(text.into()),
                index: Some(0),
                finish_reason: Some("stop".to_string()),
            }],
            ..Self::default()
        }
    }

    /// Extracts the first candidate's text, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.text.as_deref())
    }
}

/// Blocking client for the completions endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
}

impl CompletionClient {
    /// Creates a client for the default API base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Creates a client for an OpenAI-compatible server.
    pub fn with_base_url(api_key: impl Into<String>, base_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), COMPLETIONS_PATH),
        }
    }

    /// Creates a client from `OPENAI_API_KEY` and optional `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::NoApiKey)?;
        let base_url =
            std::env::var(OPENAI_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::with_base_url(api_key, &base_url))
    }

    /// Returns the full endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl TextGenerator for CompletionClient {
    fn generate(&self, request: &GenerationRequest) -> Result<CompletionResponse, GenerationError> {
        trace!(?request, "sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: CompletionResponse = response
            .json()
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        debug!(
            model = %request.model,
            choices = response.choices.len(),
            total_tokens = response.usage.as_ref().map_or(0, |u| u.total_tokens),
            "completion response received"
        );

        Ok(response)
    }
}

//! OpenAI Provider - Implementation of AIProvider for the chat completions API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAIConfig::new(api_key)
//!     .with_model("gpt-4o-mini")
//!     .with_base_url("https://api.openai.com/v1");
//!
//! let provider = OpenAIProvider::new(config, clients::http_client()?);
//! ```
//!
//! Transient failures (rate limits, 5xx, network errors, timeouts) are
//! retried with exponential backoff up to `max_retries` times.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::companion::MessageRole;
use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TokenUsage,
};

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Default model.
    pub model: String,
    /// Base URL for the API (default: https://api.openai.com/v1).
    pub base_url: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Maximum retries on transient failures.
    pub max_retries: u32,
}

impl OpenAIConfig {
    /// Creates a new configuration with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_secret(Secret::new(api_key.into()))
    }

    /// Creates a configuration from an already wrapped key.
    pub fn from_secret(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// OpenAI API provider implementation.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Creates a provider on a shared HTTP client.
    pub fn new(config: OpenAIConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn to_openai_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: request
                .messages
                .iter()
                .map(|msg| OpenAIMessage {
                    role: role_name(msg.role).to_string(),
                    content: msg.content.clone(),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, AIError> {
        self.client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key())
            .timeout(self.config.timeout)
            .json(&self.to_openai_request(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    AIError::network(format!("Connection failed: {}", e))
                } else {
                    AIError::network(e.to_string())
                }
            })
    }

    async fn parse_response(&self, response: Response) -> Result<CompletionResponse, AIError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status.as_u16(), &body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AIError::network(format!("Failed to read response: {}", e)))?;
        completion_from_body(&body)
    }

    async fn attempt(&self, request: &CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send_request(request).await?;
        self.parse_response(response).await
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut retry_count = 0;

        loop {
            match self.attempt(&request).await {
                Ok(completion) => {
                    debug!(
                        trace_id = %request.metadata.trace_id,
                        model = %completion.model,
                        total_tokens = completion.usage.total_tokens,
                        "openai completion received"
                    );
                    return Ok(completion);
                }
                Err(err) if err.is_retryable() && retry_count < self.config.max_retries => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(1 << retry_count);
                    warn!(
                        trace_id = %request.metadata.trace_id,
                        error = %err,
                        retry_in = ?delay,
                        "openai request failed, retrying"
                    );
                    sleep(delay).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

fn role_name(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

/// Maps a non-success status to an `AIError`.
fn map_status(status: u16, body: &str) -> AIError {
    match status {
        401 | 403 => AIError::AuthenticationFailed,
        429 => AIError::rate_limited(parse_retry_after(body)),
        400 if body.contains("content_filter") || body.contains("content_policy") => {
            AIError::content_filtered(body.to_string())
        }
        400 | 404 | 422 => AIError::InvalidRequest(body.to_string()),
        500..=599 => AIError::unavailable(format!("Server error {}: {}", status, body)),
        _ => AIError::network(format!("Unexpected status {}: {}", status, body)),
    }
}

/// Extracts "try again in Ns" from an error body, defaulting to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    const DEFAULT_RETRY_AFTER: u32 = 30;
    const MARKER: &str = "try again in ";

    serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|parsed| {
            let message = parsed.get("error")?.get("message")?.as_str()?.to_string();
            let rest = &message[message.find(MARKER)? + MARKER.len()..];
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

fn completion_from_body(body: &str) -> Result<CompletionResponse, AIError> {
    let openai_response: OpenAIResponse = serde_json::from_str(body)
        .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

    let choice = openai_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AIError::parse("No choices in response"))?;

    let finish_reason = match choice.finish_reason.as_deref() {
        Some("length") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    };

    let usage = openai_response
        .usage
        .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(CompletionResponse {
        content: choice.message.content.unwrap_or_default(),
        usage,
        model: openai_response.model,
        finish_reason,
    })
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

//! OpenAI-compatible chat completions adapter.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::task::ports::{CompletionClient, CompletionError, CompletionRequest, CompletionResult};

/// Default chat completions endpoint.
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

const PROVIDER: &str = "openai";

/// Connection settings for the chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiConfig {
    /// Bearer token; calls fail with a missing-key error when absent.
    pub api_key: Option<String>,
    /// Full URL of the chat completions endpoint.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Option<Duration>,
}

impl OpenAiConfig {
    /// Creates a config for the public endpoint.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: DEFAULT_OPENAI_URL.to_owned(),
            request_timeout: None,
        }
    }

    /// Overrides the endpoint URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

/// Completion client backed by an OpenAI-compatible HTTP API.
///
/// The underlying `reqwest::Client` is built once at construction and shared
/// by every call, so concurrent pipelines never race on initialization.
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiCompletionClient {
    /// Creates a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Network`] when the HTTP client cannot be
    /// built.
    pub fn new(config: OpenAiConfig) -> CompletionResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| CompletionError::Network(err.to_string()))?;
        Ok(Self { config, client })
    }

    /// Returns the configured endpoint URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Builds the chat completions request body.
fn build_request_body(request: &CompletionRequest) -> Value {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = &request.system_prompt {
        messages.push(json!({ "role": "system", "content": system }));
    }
    messages.push(json!({ "role": "user", "content": request.prompt }));

    json!({
        "model": request.model,
        "messages": messages,
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    })
}

/// Extracts the first choice's content from a response body.
fn parse_completion(body: &str) -> CompletionResult<String> {
    let response: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|err| CompletionError::Parse(err.to_string()))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(CompletionError::EmptyResponse)
}

/// Maps a non-success HTTP status to a completion error.
fn parse_http_error(status: u16, body: &str) -> CompletionError {
    let message = match status {
        401 => format!("{PROVIDER}: invalid API key"),
        403 => format!("{PROVIDER}: access denied"),
        _ => body.to_owned(),
    };
    CompletionError::Provider { status, message }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<String> {
        let api_key =
            self.config
                .api_key
                .as_deref()
                .ok_or_else(|| CompletionError::MissingApiKey {
                    provider: PROVIDER.to_owned(),
                })?;

        debug!(
            model = %request.model,
            max_tokens = request.max_tokens,
            "sending completion request"
        );
        let body = build_request_body(&request);
        let response = self
            .client
            .post(&self.config.base_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| CompletionError::Network(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| CompletionError::Network(err.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "completion provider rejected request");
            return Err(parse_http_error(status.as_u16(), &text));
        }
        parse_completion(&text)
    }
}

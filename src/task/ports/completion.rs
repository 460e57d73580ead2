//! Completion port for the external text-generation service.

use async_trait::async_trait;
use thiserror::Error;

/// Result type for completion calls.
pub type CompletionResult<T> = Result<T, CompletionError>;

/// Single prompt-in, text-out request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Prompt text sent as the user message.
    pub prompt: String,
    /// Model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Token budget for the completion.
    pub max_tokens: u32,
    /// Optional system prompt sent ahead of the user message.
    pub system_prompt: Option<String>,
}

/// Text-completion contract used by the task pipeline.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends a prompt and returns the generated text.
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<String>;
}

/// Errors returned by completion adapters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// No API key is configured for the provider.
    #[error("API key not configured for {provider}")]
    MissingApiKey {
        /// Provider name.
        provider: String,
    },

    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(String),

    /// The provider rejected the request.
    #[error("provider returned HTTP {status}: {message}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Response body or provider message.
        message: String,
    },

    /// The provider response could not be decoded.
    #[error("failed to parse completion response: {0}")]
    Parse(String),

    /// The provider returned no completion text.
    #[error("completion response contained no content")]
    EmptyResponse,

    /// The completion backend is unavailable.
    #[error("completion backend unavailable: {0}")]
    Unavailable(String),
}

//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while validating an incoming task request.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskRequestError {
    /// The prompt is empty.
    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// The temperature is outside the accepted range.
    #[error("invalid temperature {0}, expected a value between 0.0 and 2.0")]
    InvalidTemperature(f64),

    /// The token budget is not a positive integer.
    #[error("invalid max_tokens {0}, expected a positive integer")]
    InvalidMaxTokens(i64),
}

/// Errors returned while constructing step log values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StepLogError {
    /// The progress fraction is outside `[0, 1]`.
    #[error("invalid step progress {0}, expected a fraction between 0 and 1")]
    InvalidProgress(f64),
}

/// Error returned while parsing task statuses from text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

//! Request and response bodies of the HTTP API.

use crate::task::domain::{TaskId, TaskMetadata, TaskRequest, TaskRequestError, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size of `GET /tasks`.
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskBody {
    /// Natural-language task.
    pub prompt: String,
    /// Model override.
    #[serde(default)]
    pub model: Option<String>,
    /// Temperature override.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Token budget override.
    #[serde(default)]
    pub max_tokens: Option<i64>,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Free-form options stored with the request.
    #[serde(default)]
    pub options: Option<TaskMetadata>,
}

impl CreateTaskBody {
    /// Validates the body into a task request.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRequestError`] when the prompt is empty or a generation
    /// override is out of range.
    pub fn into_request(self) -> Result<TaskRequest, TaskRequestError> {
        let mut request = TaskRequest::new(self.prompt)?;
        if let Some(model) = self.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature)?;
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens)?;
        }
        if let Some(system_prompt) = self.system_prompt {
            request = request.with_system_prompt(system_prompt);
        }
        if let Some(options) = self.options {
            request = request.with_options(options);
        }
        Ok(request)
    }
}

/// Response of `POST /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreatedResponse {
    /// Identifier of the new task.
    pub id: TaskId,
    /// Always `pending`.
    pub status: TaskStatus,
    /// Human-readable acknowledgement.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Configured deadline in seconds, if any.
    pub estimated_duration: Option<u64>,
}

/// Query string of `GET /tasks`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListTasksQuery {
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Records to skip.
    #[serde(default)]
    pub offset: usize,
}

const fn default_limit() -> usize {
    DEFAULT_LIST_LIMIT
}

/// Plain acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    /// Message text.
    pub message: String,
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error description.
    pub detail: String,
}

//! Task record and related lifecycle types.

use super::{ParseTaskStatusError, StepLog, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata attached to a task record.
pub type TaskMetadata = Map<String, Value>;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been accepted but execution has not started.
    Pending,
    /// Task pipeline is executing.
    Running,
    /// Task finished and produced output.
    Completed,
    /// Task execution failed.
    Failed,
    /// Task was cancelled while in flight.
    Cancelled,
}

impl TaskStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` when no further transitions are expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Partial update applied to a task record.
///
/// Only the fields that are set are written; the status is always written.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskStatusUpdate {
    status: TaskStatus,
    output: Option<String>,
    error: Option<String>,
    metadata: Option<TaskMetadata>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl TaskStatusUpdate {
    /// Creates an update that only sets the status.
    #[must_use]
    pub const fn new(status: TaskStatus) -> Self {
        Self {
            status,
            output: None,
            error: None,
            metadata: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Sets the task output.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Sets the task error text.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets a metadata patch merged key-wise over existing metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: TaskMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Sets the start timestamp.
    #[must_use]
    pub const fn with_started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Sets the completion timestamp.
    #[must_use]
    pub const fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }

    /// Returns the status carried by this update.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }
}

/// Task record tracked from submission to a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    id: TaskId,
    status: TaskStatus,
    output: Option<String>,
    error: Option<String>,
    steps: Vec<StepLog>,
    metadata: TaskMetadata,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    duration: Option<f64>,
}

impl TaskRecord {
    /// Creates a pending record with no steps.
    #[must_use]
    pub fn new(id: TaskId, clock: &impl Clock) -> Self {
        Self {
            id,
            status: TaskStatus::Pending,
            output: None,
            error: None,
            steps: Vec::new(),
            metadata: TaskMetadata::new(),
            created_at: clock.utc(),
            started_at: None,
            completed_at: None,
            duration: None,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the task output, if any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Returns the error text, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the step log snapshot in call order.
    #[must_use]
    pub fn steps(&self) -> &[StepLog] {
        &self.steps
    }

    /// Returns the task metadata.
    #[must_use]
    pub const fn metadata(&self) -> &TaskMetadata {
        &self.metadata
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the start timestamp, if any.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns the completion timestamp, if any.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the duration in seconds once both timestamps are known.
    #[must_use]
    pub const fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Applies a partial status update.
    ///
    /// The metadata patch is merged over existing keys. A `Running` update
    /// that carries a start timestamp begins a new run and clears the
    /// previous run's output, error and completion time. The duration is
    /// set exactly when both timestamps are known.
    pub fn apply_update(&mut self, update: TaskStatusUpdate) {
        if update.status == TaskStatus::Running && update.started_at.is_some() {
            self.output = None;
            self.error = None;
            self.completed_at = None;
        }
        self.status = update.status;
        if let Some(output) = update.output {
            self.output = Some(output);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(patch) = update.metadata {
            self.metadata.extend(patch);
        }
        if let Some(started_at) = update.started_at {
            self.started_at = Some(started_at);
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
        }
        self.duration = self
            .started_at
            .zip(self.completed_at)
            .map(|(started_at, completed_at)| elapsed_seconds(started_at, completed_at));
    }

    /// Replaces the step snapshot with the store's current sequence.
    pub fn replace_steps(&mut self, steps: Vec<StepLog>) {
        self.steps = steps;
    }
}

/// Returns the seconds elapsed between two timestamps at microsecond
/// precision.
#[must_use]
#[expect(
    clippy::cast_precision_loss,
    clippy::float_arithmetic,
    reason = "durations are reported as fractional seconds"
)]
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let delta = end - start;
    delta.num_microseconds().map_or_else(
        || delta.num_milliseconds() as f64 / 1_000.0,
        |micros| micros as f64 / 1_000_000.0,
    )
}

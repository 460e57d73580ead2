//! Step log records for the phases of a task pipeline.

use super::{StepId, StepLogError, TaskId, elapsed_seconds};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of a single pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not started.
    Pending,
    /// Step is executing.
    Running,
    /// Step finished successfully.
    Completed,
    /// Step failed.
    Failed,
    /// Step was skipped.
    Skipped,
}

impl StepStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Returns `true` for statuses that close a step.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One entry in a task's step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLog {
    id: StepId,
    task_id: TaskId,
    step_name: String,
    status: StepStatus,
    message: Option<String>,
    details: Option<Value>,
    error: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    duration: Option<f64>,
    progress: Option<f64>,
}

impl StepLog {
    /// Records a step observation at the current clock time.
    ///
    /// Completed and failed entries are closed immediately, so they carry a
    /// completion timestamp and a duration.
    #[must_use]
    pub fn record(
        task_id: &TaskId,
        step_name: impl Into<String>,
        status: StepStatus,
        clock: &impl Clock,
    ) -> Self {
        let step_name = step_name.into();
        let started_at = clock.utc();
        let (completed_at, duration) = if status.is_finished() {
            let completed_at = clock.utc();
            (
                Some(completed_at),
                Some(elapsed_seconds(started_at, completed_at)),
            )
        } else {
            (None, None)
        };

        Self {
            id: StepId::derive(task_id, &step_name),
            task_id: task_id.clone(),
            step_name,
            status,
            message: None,
            details: None,
            error: None,
            started_at: Some(started_at),
            completed_at,
            duration,
            progress: None,
        }
    }

    /// Sets the step message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets structured step details.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Sets the step error text.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Sets the progress fraction.
    ///
    /// # Errors
    ///
    /// Returns [`StepLogError::InvalidProgress`] when the value is not a
    /// finite fraction in `[0, 1]`.
    pub fn with_progress(mut self, progress: f64) -> Result<Self, StepLogError> {
        if !(0.0..=1.0).contains(&progress) {
            return Err(StepLogError::InvalidProgress(progress));
        }
        self.progress = Some(progress);
        Ok(self)
    }

    /// Returns the step identifier.
    #[must_use]
    pub const fn id(&self) -> &StepId {
        &self.id
    }

    /// Returns the parent task identifier.
    #[must_use]
    pub const fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the step name.
    #[must_use]
    pub fn step_name(&self) -> &str {
        &self.step_name
    }

    /// Returns the step status.
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }

    /// Returns the step message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns structured details, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Returns the error text, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
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

    /// Returns the duration in seconds, if the step is closed.
    #[must_use]
    pub const fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Returns the progress fraction, if any.
    #[must_use]
    pub const fn progress(&self) -> Option<f64> {
        self.progress
    }
}

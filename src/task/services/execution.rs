//! Service layer for task submission, execution and cancellation.

use super::pipeline::{PipelineError, PipelineOutcome, TaskPipeline};
use super::registry::{InFlightGuard, InFlightRegistry};
use crate::task::{
    domain::{
        GenerationDefaults, TaskId, TaskRecord, TaskRequest, TaskStatistics, TaskStatus,
        TaskStatusUpdate,
    },
    ports::{CompletionClient, TaskStore, TaskStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Service-level errors for task execution operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Store operation failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
}

/// Result type for task execution service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// How a spawned pipeline run ended.
enum RunEnd {
    Finished(Result<PipelineOutcome, PipelineError>),
    Joined(JoinError),
    TimedOut(Duration),
}

/// Task execution orchestration service.
///
/// Owns the in-flight registry and writes the lifecycle status transitions
/// of every task it runs. Cloning the service shares the registry.
pub struct TaskExecutionService<S, L, C>
where
    S: TaskStore,
    L: CompletionClient,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    pipeline: TaskPipeline<S, L, C>,
    clock: Arc<C>,
    registry: Arc<InFlightRegistry>,
    max_task_duration: Option<Duration>,
}

impl<S, L, C> Clone for TaskExecutionService<S, L, C>
where
    S: TaskStore,
    L: CompletionClient,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pipeline: self.pipeline.clone(),
            clock: Arc::clone(&self.clock),
            registry: Arc::clone(&self.registry),
            max_task_duration: self.max_task_duration,
        }
    }
}

impl<S, L, C> TaskExecutionService<S, L, C>
where
    S: TaskStore + 'static,
    L: CompletionClient + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a new task execution service.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        completion: Arc<L>,
        clock: Arc<C>,
        defaults: GenerationDefaults,
    ) -> Self {
        let pipeline = TaskPipeline::new(Arc::clone(&store), completion, Arc::clone(&clock), defaults);
        Self {
            store,
            pipeline,
            clock,
            registry: Arc::new(InFlightRegistry::new()),
            max_task_duration: None,
        }
    }

    /// Limits how long a single pipeline run may take.
    ///
    /// `None` lets runs take as long as they need.
    #[must_use]
    pub const fn with_max_task_duration(mut self, limit: Option<Duration>) -> Self {
        self.max_task_duration = limit;
        self
    }

    /// Creates a pending task and starts executing it in the background.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the pending record cannot be
    /// created.
    pub async fn submit(&self, request: TaskRequest) -> TaskServiceResult<TaskRecord> {
        let task_id = TaskId::new();
        let record = self.store.create_task(&task_id).await?;
        info!(task_id = %task_id, "task created");

        let service = self.clone();
        tokio::spawn(async move {
            service.execute_task(task_id, request).await;
        });
        Ok(record)
    }

    /// Runs the pipeline for `task_id` and records its terminal status.
    ///
    /// Failures are written to the task record rather than returned. When
    /// the task is cancelled while running, the canceller records the final
    /// status and this call leaves it untouched.
    pub async fn execute_task(&self, task_id: TaskId, request: TaskRequest) {
        let running = TaskStatusUpdate::new(TaskStatus::Running).with_started_at(self.clock.utc());
        if let Err(err) = self.store.upsert_status(&task_id, running).await {
            error!(task_id = %task_id, error = %err, "could not mark task running");
            return;
        }
        info!(task_id = %task_id, "task execution started");

        let token = CancellationToken::new();
        let ticket = self.registry.register(&task_id, token.clone());
        let mut guard = InFlightGuard::new(
            Arc::clone(&self.registry),
            task_id.clone(),
            ticket,
            token.clone(),
        );

        let pipeline = self.pipeline.clone();
        let run_id = task_id.clone();
        let run_token = token.clone();
        let mut handle =
            tokio::spawn(async move { pipeline.run(&run_id, &request, &run_token).await });
        let abort = handle.abort_handle();
        guard.set_abort(abort.clone());
        if !self.registry.attach_abort(&task_id, ticket, abort) {
            handle.abort();
        }

        let end = match self.max_task_duration {
            Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                Ok(joined) => joined.map_or_else(RunEnd::Joined, RunEnd::Finished),
                Err(_) => {
                    token.cancel();
                    handle.abort();
                    RunEnd::TimedOut(limit)
                }
            },
            None => (&mut handle)
                .await
                .map_or_else(RunEnd::Joined, RunEnd::Finished),
        };

        if !guard.finish() {
            debug!(task_id = %task_id, "task status already recorded by canceller");
            return;
        }

        let update = self.terminal_update(&task_id, end);
        let status = update.status();
        match self.store.upsert_status(&task_id, update).await {
            Ok(_) => info!(task_id = %task_id, status = status.as_str(), "task execution finished"),
            Err(err) => {
                error!(task_id = %task_id, error = %err, "could not record task outcome");
            }
        }
    }

    fn terminal_update(&self, task_id: &TaskId, end: RunEnd) -> TaskStatusUpdate {
        let completed_at = self.clock.utc();
        match end {
            RunEnd::Finished(Ok(outcome)) => TaskStatusUpdate::new(TaskStatus::Completed)
                .with_output(outcome.output)
                .with_metadata(outcome.metadata)
                .with_completed_at(completed_at),
            RunEnd::Finished(Err(PipelineError::Cancelled)) => {
                TaskStatusUpdate::new(TaskStatus::Cancelled).with_completed_at(completed_at)
            }
            RunEnd::Finished(Err(err)) => failed(err.to_string(), completed_at),
            RunEnd::Joined(err) if err.is_cancelled() => {
                TaskStatusUpdate::new(TaskStatus::Cancelled).with_completed_at(completed_at)
            }
            RunEnd::Joined(err) => {
                error!(task_id = %task_id, error = %err, "task execution panicked");
                failed("task execution panicked".to_owned(), completed_at)
            }
            RunEnd::TimedOut(limit) => {
                let limit_secs = limit.as_secs_f64();
                warn!(task_id = %task_id, limit_secs, "task timed out");
                failed(
                    format!("task exceeded maximum duration of {limit_secs}s"),
                    completed_at,
                )
            }
        }
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the lookup fails.
    pub async fn get_task_status(&self, task_id: &TaskId) -> TaskServiceResult<Option<TaskRecord>> {
        Ok(self.store.find_by_id(task_id).await?)
    }

    /// Cancels an in-flight task.
    ///
    /// Returns `Ok(false)` when the task is unknown or has already finished.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the cancelled status cannot be
    /// recorded.
    pub async fn cancel_task(&self, task_id: &TaskId) -> TaskServiceResult<bool> {
        if !self.registry.cancel(task_id) {
            debug!(task_id = %task_id, "cancel requested for task that is not in flight");
            return Ok(false);
        }
        let update =
            TaskStatusUpdate::new(TaskStatus::Cancelled).with_completed_at(self.clock.utc());
        self.store.upsert_status(task_id, update).await?;
        info!(task_id = %task_id, "task cancelled");
        Ok(true)
    }

    /// Lists tasks, most recently started first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the listing fails.
    pub async fn list_tasks(&self, limit: usize, offset: usize) -> TaskServiceResult<Vec<TaskRecord>> {
        Ok(self.store.list(limit, offset).await?)
    }

    /// Computes aggregate execution statistics.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the store cannot be read.
    pub async fn statistics(&self) -> TaskServiceResult<TaskStatistics> {
        Ok(self.store.statistics().await?)
    }

    /// Returns the number of tasks currently executing.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns whether `task_id` is currently executing.
    #[must_use]
    pub fn is_in_flight(&self, task_id: &TaskId) -> bool {
        self.registry.contains(task_id)
    }
}

fn failed(message: String, completed_at: chrono::DateTime<chrono::Utc>) -> TaskStatusUpdate {
    TaskStatusUpdate::new(TaskStatus::Failed)
        .with_error(message)
        .with_completed_at(completed_at)
}

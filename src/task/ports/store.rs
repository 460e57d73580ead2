//! Store port for task records and their step logs.

use crate::task::domain::{StepLog, TaskId, TaskRecord, TaskStatistics, TaskStatusUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task storage contract.
///
/// Services depend only on this trait, so a durable backend can replace the
/// in-memory adapter without touching orchestration code.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Creates a pending record with an empty step list.
    ///
    /// Re-creating an existing identifier overwrites the record and resets
    /// its step list.
    async fn create_task(&self, id: &TaskId) -> TaskStoreResult<TaskRecord>;

    /// Applies a status update, creating the record first when it is absent.
    ///
    /// Returns the record as stored after the update.
    async fn upsert_status(
        &self,
        id: &TaskId,
        update: TaskStatusUpdate,
    ) -> TaskStoreResult<TaskRecord>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: &TaskId) -> TaskStoreResult<Option<TaskRecord>>;

    /// Returns a page of tasks, most recently started first.
    ///
    /// Tasks without a start timestamp sort after every started task.
    async fn list(&self, limit: usize, offset: usize) -> TaskStoreResult<Vec<TaskRecord>>;

    /// Appends a step log entry and refreshes the record's step snapshot.
    async fn append_step(&self, id: &TaskId, step: StepLog) -> TaskStoreResult<()>;

    /// Computes execution statistics over every stored task.
    async fn statistics(&self) -> TaskStoreResult<TaskStatistics>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

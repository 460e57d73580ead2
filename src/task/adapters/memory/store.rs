//! In-memory task store.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::task::{
    domain::{StepLog, TaskId, TaskRecord, TaskStatistics, TaskStatusUpdate},
    ports::{TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
///
/// Every operation completes its read-modify-write under a single lock
/// guard without suspending, so concurrent updates to the same task are
/// serialized.
pub struct InMemoryTaskStore<C = DefaultClock> {
    state: Arc<RwLock<InMemoryTaskState>>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, TaskRecord>,
    steps: HashMap<TaskId, Vec<StepLog>>,
}

impl InMemoryTaskStore {
    /// Creates an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InMemoryTaskStore<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C> InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    /// Creates an empty store stamping creation times from `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            clock,
        }
    }
}

fn lock_error<T>(err: PoisonError<T>) -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other(err.to_string()))
}

/// Orders records by start time descending, unstarted records last.
fn compare_for_listing(a: &TaskRecord, b: &TaskRecord) -> std::cmp::Ordering {
    b.started_at()
        .cmp(&a.started_at())
        .then_with(|| b.created_at().cmp(&a.created_at()))
        .then_with(|| a.id().cmp(b.id()))
}

#[async_trait]
impl<C> TaskStore for InMemoryTaskStore<C>
where
    C: Clock + Send + Sync,
{
    async fn create_task(&self, id: &TaskId) -> TaskStoreResult<TaskRecord> {
        let mut state = self.state.write().map_err(lock_error)?;
        let record = TaskRecord::new(id.clone(), &*self.clock);
        state.tasks.insert(id.clone(), record.clone());
        state.steps.insert(id.clone(), Vec::new());
        Ok(record)
    }

    async fn upsert_status(
        &self,
        id: &TaskId,
        update: TaskStatusUpdate,
    ) -> TaskStoreResult<TaskRecord> {
        let mut guard = self.state.write().map_err(lock_error)?;
        let state = &mut *guard;

        let record = state.tasks.entry(id.clone()).or_insert_with(|| {
            // Steps logged before the record existed stay attached.
            let mut created = TaskRecord::new(id.clone(), &*self.clock);
            if let Some(steps) = state.steps.get(id) {
                created.replace_steps(steps.clone());
            }
            created
        });
        record.apply_update(update);
        Ok(record.clone())
    }

    async fn find_by_id(&self, id: &TaskId) -> TaskStoreResult<Option<TaskRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(id).cloned())
    }

    async fn list(&self, limit: usize, offset: usize) -> TaskStoreResult<Vec<TaskRecord>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut records: Vec<&TaskRecord> = state.tasks.values().collect();
        records.sort_by(|a, b| compare_for_listing(a, b));
        Ok(records
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn append_step(&self, id: &TaskId, step: StepLog) -> TaskStoreResult<()> {
        let mut guard = self.state.write().map_err(lock_error)?;
        let state = &mut *guard;

        let steps = state.steps.entry(id.clone()).or_default();
        steps.push(step);
        if let Some(record) = state.tasks.get_mut(id) {
            record.replace_steps(steps.clone());
        }
        Ok(())
    }

    async fn statistics(&self) -> TaskStoreResult<TaskStatistics> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(TaskStatistics::from_records(state.tasks.values()))
    }
}

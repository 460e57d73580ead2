//! Shared test helpers for in-memory integration tests.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use taskflow::task::{
    adapters::memory::{InMemoryTaskStore, ScriptedCompletionClient},
    domain::{GenerationDefaults, TaskId, TaskRecord, TaskRequest, TaskStatus},
    services::TaskExecutionService,
};

/// Service type used by the execution tests.
pub type TestService =
    TaskExecutionService<InMemoryTaskStore, ScriptedCompletionClient, DefaultClock>;

/// Provides a fresh in-memory store for each test.
#[fixture]
pub fn store() -> Arc<InMemoryTaskStore> {
    Arc::new(InMemoryTaskStore::new())
}

/// Builds a service over `store` answering from `completion`.
pub fn service_over(
    store: &Arc<InMemoryTaskStore>,
    completion: ScriptedCompletionClient,
) -> TestService {
    TaskExecutionService::new(
        Arc::clone(store),
        Arc::new(completion),
        Arc::new(DefaultClock),
        GenerationDefaults::default(),
    )
}

/// Builds a validated request for `prompt`.
pub fn request(prompt: &str) -> TaskRequest {
    TaskRequest::new(prompt).expect("prompt should be valid")
}

/// Polls until `task_id` reaches `status`, returning the record.
///
/// Gives up after roughly two seconds.
pub async fn wait_for_status(
    service: &TestService,
    task_id: &TaskId,
    status: TaskStatus,
) -> Option<TaskRecord> {
    for _ in 0..200 {
        let found = service
            .get_task_status(task_id)
            .await
            .expect("lookup should succeed")
            .filter(|record| record.status() == status);
        if found.is_some() {
            return found;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    None
}

/// Polls until `task_id` is registered as in flight.
pub async fn wait_until_in_flight(service: &TestService, task_id: &TaskId) -> bool {
    for _ in 0..200 {
        if service.is_in_flight(task_id) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

//! Shared world state for task execution BDD scenarios.

use std::sync::Arc;
use std::time::Duration;

use mockable::DefaultClock;
use rstest::fixture;
use taskflow::task::{
    adapters::memory::{InMemoryTaskStore, ScriptedCompletionClient},
    domain::{GenerationDefaults, TaskId},
    services::TaskExecutionService,
};

/// Service type used by the BDD world.
pub type TestTaskService =
    TaskExecutionService<InMemoryTaskStore, ScriptedCompletionClient, DefaultClock>;

/// Delay applied to every completion when the backend is slow.
pub const SLOW_RESPONSE: Duration = Duration::from_secs(30);

/// Scenario world for task execution behaviour tests.
pub struct TaskExecutionWorld {
    pub completion: ScriptedCompletionClient,
    pub max_task_duration: Option<Duration>,
    pub service: Option<TestTaskService>,
    pub task_id: Option<TaskId>,
    pub cancel_result: Option<bool>,
}

impl TaskExecutionWorld {
    /// Creates a world with an empty completion script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            completion: ScriptedCompletionClient::new(),
            max_task_duration: None,
            service: None,
            task_id: None,
            cancel_result: None,
        }
    }

    /// Returns the service, building it from the configured backend on
    /// first use.
    pub fn service(&mut self) -> &TestTaskService {
        let completion = self.completion.clone();
        let limit = self.max_task_duration;
        self.service.get_or_insert_with(|| {
            TaskExecutionService::new(
                Arc::new(InMemoryTaskStore::new()),
                Arc::new(completion),
                Arc::new(DefaultClock),
                GenerationDefaults::default(),
            )
            .with_max_task_duration(limit)
        })
    }
}

impl Default for TaskExecutionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskExecutionWorld {
    TaskExecutionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

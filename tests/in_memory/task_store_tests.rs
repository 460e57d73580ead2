//! In-memory integration tests for task persistence through the store port.

use std::sync::Arc;

use super::helpers::store;
use rstest::rstest;
use serde_json::json;
use taskflow::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{StepLog, StepStatus, TaskId, TaskStatus, TaskStatusUpdate},
    ports::TaskStore,
};

fn step(task_id: &TaskId, name: &str, status: StepStatus) -> StepLog {
    StepLog::record(task_id, name, status, &mockable::DefaultClock)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn terminal_update_is_visible_to_readers(store: Arc<InMemoryTaskStore>) {
    let task_id = TaskId::from("task-store-1");
    store.create_task(&task_id).await.expect("create");

    let mut metadata = serde_json::Map::new();
    metadata.insert("model".to_owned(), json!("gpt-4"));
    store
        .upsert_status(
            &task_id,
            TaskStatusUpdate::new(TaskStatus::Completed)
                .with_output("done")
                .with_metadata(metadata),
        )
        .await
        .expect("update");

    let record = store
        .find_by_id(&task_id)
        .await
        .expect("lookup")
        .expect("record exists");
    assert_eq!(record.status(), TaskStatus::Completed);
    assert_eq!(record.output(), Some("done"));
    assert_eq!(record.metadata().get("model"), Some(&json!("gpt-4")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn steps_appended_concurrently_are_all_kept(store: Arc<InMemoryTaskStore>) {
    let task_id = TaskId::from("task-store-2");
    store.create_task(&task_id).await.expect("create");

    let writers = (0..8).map(|index| {
        let writer = Arc::clone(&store);
        let owner = task_id.clone();
        let log = step(&task_id, &format!("Step {index}"), StepStatus::Completed);
        tokio::spawn(async move { writer.append_step(&owner, log).await })
    });
    for handle in writers.collect::<Vec<_>>() {
        handle.await.expect("join").expect("append");
    }

    let record = store
        .find_by_id(&task_id)
        .await
        .expect("lookup")
        .expect("record exists");
    assert_eq!(record.steps().len(), 8);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statistics_reflect_every_status(store: Arc<InMemoryTaskStore>) {
    for (id, status) in [
        ("a", TaskStatus::Completed),
        ("b", TaskStatus::Failed),
        ("c", TaskStatus::Running),
        ("d", TaskStatus::Pending),
    ] {
        let task_id = TaskId::from(id);
        store.create_task(&task_id).await.expect("create");
        store
            .upsert_status(&task_id, TaskStatusUpdate::new(status))
            .await
            .expect("update");
    }

    let statistics = store.statistics().await.expect("statistics");

    assert_eq!(statistics.total, 4);
    assert_eq!(statistics.completed, 1);
    assert_eq!(statistics.failed, 1);
    assert_eq!(statistics.running, 1);
    assert_eq!(statistics.success_rate, 0.25);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn paging_past_the_end_is_empty(store: Arc<InMemoryTaskStore>) {
    store.create_task(&TaskId::from("only")).await.expect("create");

    let page = store.list(10, 5).await.expect("list");

    assert!(page.is_empty());
}

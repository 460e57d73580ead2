//! In-memory integration tests for background task execution.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{request, service_over, store, wait_for_status, wait_until_in_flight};
use rstest::rstest;
use taskflow::task::{
    adapters::memory::{InMemoryTaskStore, ScriptedCompletionClient},
    domain::{StepStatus, TaskStatus},
    ports::TaskStore,
    services::{EXECUTION_FAILURE_STEP, INITIALIZATION_STEP},
};

const FULL_SCRIPT: [&str; 3] = ["1. Outline", "Final answer", "Looks good"];

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submitted_task_reports_its_step_trail(store: Arc<InMemoryTaskStore>) {
    let service = service_over(&store, ScriptedCompletionClient::with_responses(FULL_SCRIPT));

    let created = service.submit(request("Summarize the report")).await.expect("submit");
    let finished = wait_for_status(&service, created.id(), TaskStatus::Completed)
        .await
        .expect("task should complete");

    let names: Vec<&str> = finished.steps().iter().map(|step| step.step_name()).collect();
    assert_eq!(
        names,
        [
            INITIALIZATION_STEP,
            "Planning",
            "Planning",
            "Execution",
            "Execution",
            "Reflection",
            "Reflection",
        ]
    );
    assert!(
        finished
            .steps()
            .iter()
            .all(|step| step.status() != StepStatus::Failed)
    );
    assert_eq!(finished.created_at(), created.created_at());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_submissions_finish_independently(store: Arc<InMemoryTaskStore>) {
    let script = FULL_SCRIPT.iter().cycle().take(FULL_SCRIPT.len() * 3).copied();
    let completion = ScriptedCompletionClient::with_responses(script)
        .with_delay(Duration::from_millis(5));
    let service = service_over(&store, completion);

    let mut created = Vec::new();
    for prompt in ["First", "Second", "Third"] {
        created.push(service.submit(request(prompt)).await.expect("submit"));
    }

    for record in &created {
        let finished = wait_for_status(&service, record.id(), TaskStatus::Completed).await;
        assert!(finished.is_some(), "task {} did not complete", record.id());
    }
    assert_eq!(service.in_flight_count(), 0);
    let statistics = store.statistics().await.expect("statistics");
    assert_eq!(statistics.total, 3);
    assert_eq!(statistics.completed, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancellation_stops_the_pipeline_mid_stage(store: Arc<InMemoryTaskStore>) {
    let completion = ScriptedCompletionClient::with_responses(FULL_SCRIPT)
        .with_delay(Duration::from_secs(30));
    let service = service_over(&store, completion);

    let created = service.submit(request("Write a long essay")).await.expect("submit");
    let task_id = created.id().clone();
    assert!(wait_until_in_flight(&service, &task_id).await);

    assert!(service.cancel_task(&task_id).await.expect("cancel"));
    assert!(!service.cancel_task(&task_id).await.expect("second cancel"));

    let record = store
        .find_by_id(&task_id)
        .await
        .expect("lookup")
        .expect("record exists");
    assert_eq!(record.status(), TaskStatus::Cancelled);
    assert!(record.output().is_none());
    assert!(
        !record
            .steps()
            .iter()
            .any(|step| step.step_name() == "Reflection"),
        "reflection must not start after cancellation"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_completion_backend_fails_the_task(store: Arc<InMemoryTaskStore>) {
    let service = service_over(
        &store,
        ScriptedCompletionClient::with_responses(["1. Outline"]),
    );

    let created = service.submit(request("Plan only")).await.expect("submit");
    let failed = wait_for_status(&service, created.id(), TaskStatus::Failed)
        .await
        .expect("task should fail");

    assert!(failed.error().is_some_and(|message| !message.is_empty()));
    let last = failed.steps().last().expect("failure step");
    assert_eq!(last.status(), StepStatus::Failed);
    assert_eq!(last.step_name(), EXECUTION_FAILURE_STEP);
}

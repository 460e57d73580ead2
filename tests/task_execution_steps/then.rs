//! Then steps for task execution BDD scenarios.

use std::time::Duration;

use super::world::{TaskExecutionWorld, run_async};
use rstest_bdd_macros::then;
use taskflow::task::domain::{TaskRecord, TaskStatus};

fn current_record(world: &TaskExecutionWorld) -> Result<TaskRecord, eyre::Report> {
    let service = world
        .service
        .as_ref()
        .ok_or_else(|| eyre::eyre!("service was never used in this scenario"))?;
    let task_id = world
        .task_id
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing submitted task in scenario world"))?;
    run_async(service.get_task_status(task_id))
        .map_err(|err| eyre::eyre!("look up task: {err}"))?
        .ok_or_else(|| eyre::eyre!("task {task_id} is not stored"))
}

#[then(r#"the task eventually has status "{status}""#)]
fn task_eventually_has_status(
    world: &TaskExecutionWorld,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;

    let mut last = None;
    for _ in 0..200 {
        let record = current_record(world)?;
        if record.status() == expected {
            return Ok(());
        }
        last = Some(record.status());
        run_async(tokio::time::sleep(Duration::from_millis(10)));
    }
    Err(eyre::eyre!(
        "expected status {}, last saw {last:?}",
        expected.as_str()
    ))
}

#[then(r#"the task output is "{output}""#)]
fn task_output_is(world: &TaskExecutionWorld, output: String) -> Result<(), eyre::Report> {
    let record = current_record(world)?;
    if record.output() != Some(output.as_str()) {
        return Err(eyre::eyre!(
            "expected output {output:?}, found {:?}",
            record.output()
        ));
    }
    Ok(())
}

#[then(r#"the task error mentions "{fragment}""#)]
fn task_error_mentions(world: &TaskExecutionWorld, fragment: String) -> Result<(), eyre::Report> {
    let record = current_record(world)?;
    if !record.error().is_some_and(|error| error.contains(&fragment)) {
        return Err(eyre::eyre!(
            "expected error mentioning {fragment:?}, found {:?}",
            record.error()
        ));
    }
    Ok(())
}

#[then("the step log holds {count:usize} entries")]
fn step_log_holds(world: &TaskExecutionWorld, count: usize) -> Result<(), eyre::Report> {
    let record = current_record(world)?;
    if record.steps().len() != count {
        return Err(eyre::eyre!(
            "expected {count} steps, found {}",
            record.steps().len()
        ));
    }
    Ok(())
}

#[then("the cancellation is accepted")]
fn cancellation_accepted(world: &TaskExecutionWorld) -> Result<(), eyre::Report> {
    match world.cancel_result {
        Some(true) => Ok(()),
        other => Err(eyre::eyre!("expected accepted cancellation, got {other:?}")),
    }
}

#[then("the cancellation is refused")]
fn cancellation_refused(world: &TaskExecutionWorld) -> Result<(), eyre::Report> {
    match world.cancel_result {
        Some(false) => Ok(()),
        other => Err(eyre::eyre!("expected refused cancellation, got {other:?}")),
    }
}

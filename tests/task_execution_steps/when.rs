//! When steps for task execution BDD scenarios.

use std::time::Duration;

use super::world::{TaskExecutionWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskflow::task::domain::{TaskId, TaskRequest};

#[when(r#"a task "{prompt}" is submitted"#)]
fn submit_task(world: &mut TaskExecutionWorld, prompt: String) -> Result<(), eyre::Report> {
    let request = TaskRequest::new(prompt).wrap_err("build task request")?;
    let created = run_async(world.service().submit(request)).wrap_err("submit task")?;
    world.task_id = Some(created.id().clone());
    Ok(())
}

#[when("the task is cancelled once it is running")]
fn cancel_running_task(world: &mut TaskExecutionWorld) -> Result<(), eyre::Report> {
    let task_id = world
        .task_id
        .clone()
        .ok_or_else(|| eyre::eyre!("missing submitted task in scenario world"))?;
    let service = world.service();
    let cancelled = run_async(async {
        for _ in 0..200 {
            if service.is_in_flight(&task_id) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        service.cancel_task(&task_id).await
    })
    .wrap_err("cancel running task")?;
    world.cancel_result = Some(cancelled);
    Ok(())
}

#[when(r#"the task "{task_id}" is cancelled"#)]
fn cancel_named_task(world: &mut TaskExecutionWorld, task_id: String) -> Result<(), eyre::Report> {
    let cancelled = run_async(world.service().cancel_task(&TaskId::from(task_id)))
        .wrap_err("cancel named task")?;
    world.cancel_result = Some(cancelled);
    Ok(())
}

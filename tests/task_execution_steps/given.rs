//! Given steps for task execution BDD scenarios.

use std::time::Duration;

use super::world::{SLOW_RESPONSE, TaskExecutionWorld};
use rstest_bdd_macros::given;
use taskflow::task::ports::CompletionError;

#[given("the completion backend responds slowly")]
fn backend_responds_slowly(world: &mut TaskExecutionWorld) {
    world.completion = world.completion.clone().with_delay(SLOW_RESPONSE);
}

#[given(r#"the completion backend will answer "{text}""#)]
fn backend_will_answer(world: &mut TaskExecutionWorld, text: String) -> Result<(), eyre::Report> {
    world
        .completion
        .push_response(text)
        .map_err(|err| eyre::eyre!("queue scripted response: {err}"))
}

#[given(r#"the completion backend will fail with HTTP {status:u16} "{message}""#)]
fn backend_will_fail(
    world: &mut TaskExecutionWorld,
    status: u16,
    message: String,
) -> Result<(), eyre::Report> {
    world
        .completion
        .push_failure(CompletionError::Provider { status, message })
        .map_err(|err| eyre::eyre!("queue scripted failure: {err}"))
}

#[given("tasks may run for at most {millis:u64} milliseconds")]
fn tasks_have_deadline(world: &mut TaskExecutionWorld, millis: u64) {
    world.max_task_duration = Some(Duration::from_millis(millis));
}

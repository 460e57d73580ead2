//! Fixed plan, execute and reflect pipeline run for every task.

use crate::task::{
    domain::{
        GenerationDefaults, GenerationParameters, StepLog, StepStatus, TaskId, TaskMetadata,
        TaskRequest,
    },
    ports::{CompletionClient, CompletionError, CompletionRequest, TaskStore, TaskStoreError},
};
use minijinja::Environment;
use mockable::Clock;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

const PLAN_TEMPLATE: &str = "Analyze the following task and create a simple execution plan:

Task: {{ prompt }}

Provide a brief plan for executing this task.";

const EXECUTE_TEMPLATE: &str = "Based on the following plan, execute the task:

Plan: {{ plan }}
Task: {{ prompt }}

Provide a detailed response that completes the task.";

const REFLECT_TEMPLATE: &str = "Review the task execution and provide a brief reflection:

Task Output: {{ output }}

Provide a brief reflection on the execution quality and any improvements.";

/// Step name logged when a pipeline run begins.
pub const INITIALIZATION_STEP: &str = "Task Initialization";

/// Step name logged when a pipeline run fails.
pub const EXECUTION_FAILURE_STEP: &str = "Task Execution";

/// One node of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Drafts a short plan for the request.
    Plan,
    /// Produces the task output from the plan.
    Execute,
    /// Critiques the produced output.
    Reflect,
}

impl PipelineStage {
    /// Stages in execution order.
    pub const ALL: [Self; 3] = [Self::Plan, Self::Execute, Self::Reflect];

    /// Returns the node name reported in task metadata.
    #[must_use]
    pub const fn node_name(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Execute => "execute",
            Self::Reflect => "reflect",
        }
    }

    /// Returns the step name written to the step log.
    #[must_use]
    pub const fn step_name(self) -> &'static str {
        match self {
            Self::Plan => "Planning",
            Self::Execute => "Execution",
            Self::Reflect => "Reflection",
        }
    }

    const fn running_message(self) -> &'static str {
        match self {
            Self::Plan => "Analyzing task requirements",
            Self::Execute => "Executing task",
            Self::Reflect => "Analyzing execution results",
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::Plan => PLAN_TEMPLATE,
            Self::Execute => EXECUTE_TEMPLATE,
            Self::Reflect => REFLECT_TEMPLATE,
        }
    }

    /// Message logged when the stage completes with `text`.
    fn completion_message(self, text: &str) -> String {
        match self {
            Self::Plan | Self::Reflect => text.to_owned(),
            Self::Execute => "Task executed successfully".to_owned(),
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.node_name())
    }
}

/// Errors returned by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The completion call of a stage failed.
    #[error("{source}")]
    Completion {
        /// Stage whose call failed.
        stage: PipelineStage,
        /// Provider error.
        source: CompletionError,
    },

    /// A stage prompt could not be rendered.
    #[error("failed to render {stage} prompt: {reason}")]
    Template {
        /// Stage whose prompt failed.
        stage: PipelineStage,
        /// Renderer message.
        reason: String,
    },

    /// Step logging failed.
    #[error(transparent)]
    Store(#[from] TaskStoreError),

    /// The run was cancelled before it finished.
    #[error("task execution was cancelled")]
    Cancelled,
}

/// Result handed back to the execution service.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Output produced by the execute stage.
    pub output: String,
    /// Node names, model and temperature of the run.
    pub metadata: TaskMetadata,
}

/// State threaded from one node to the next.
#[derive(Debug)]
struct PipelineState {
    prompt: String,
    parameters: GenerationParameters,
    plan: Option<String>,
    output: Option<String>,
    reflection: Option<String>,
    completed: Vec<PipelineStage>,
}

impl PipelineState {
    fn new(request: &TaskRequest, defaults: &GenerationDefaults) -> Self {
        Self {
            prompt: request.prompt().to_owned(),
            parameters: request.generation_parameters(defaults),
            plan: None,
            output: None,
            reflection: None,
            completed: Vec::with_capacity(PipelineStage::ALL.len()),
        }
    }

    fn record(&mut self, stage: PipelineStage, text: String) {
        match stage {
            PipelineStage::Plan => self.plan = Some(text),
            PipelineStage::Execute => self.output = Some(text),
            PipelineStage::Reflect => self.reflection = Some(text),
        }
        self.completed.push(stage);
    }

    fn render_prompt(&self, stage: PipelineStage) -> Result<String, PipelineError> {
        let context = json!({
            "prompt": self.prompt,
            "plan": self.plan.as_deref().unwrap_or_default(),
            "output": self.output.as_deref().unwrap_or_default(),
        });
        Environment::new()
            .render_str(stage.template(), context)
            .map_err(|err| PipelineError::Template {
                stage,
                reason: err.to_string(),
            })
    }

    fn completion_request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest {
            prompt,
            model: self.parameters.model.clone(),
            temperature: self.parameters.temperature,
            max_tokens: self.parameters.max_tokens,
            system_prompt: self.parameters.system_prompt.clone(),
        }
    }

    /// The reflection stays internal to the run.
    fn into_outcome(self) -> PipelineOutcome {
        let steps: Vec<Value> = self
            .completed
            .iter()
            .map(|stage| Value::from(stage.node_name()))
            .collect();
        let mut metadata = TaskMetadata::new();
        metadata.insert("steps".to_owned(), Value::Array(steps));
        metadata.insert("model".to_owned(), Value::from(self.parameters.model));
        metadata.insert(
            "temperature".to_owned(),
            Value::from(self.parameters.temperature),
        );

        PipelineOutcome {
            output: self.output.unwrap_or_default(),
            metadata,
        }
    }
}

/// Linear three-node pipeline that logs every step to the task store.
pub struct TaskPipeline<S, L, C>
where
    S: TaskStore,
    L: CompletionClient,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    completion: Arc<L>,
    clock: Arc<C>,
    defaults: GenerationDefaults,
}

impl<S, L, C> Clone for TaskPipeline<S, L, C>
where
    S: TaskStore,
    L: CompletionClient,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            completion: Arc::clone(&self.completion),
            clock: Arc::clone(&self.clock),
            defaults: self.defaults.clone(),
        }
    }
}

impl<S, L, C> TaskPipeline<S, L, C>
where
    S: TaskStore,
    L: CompletionClient,
    C: Clock + Send + Sync,
{
    /// Creates a pipeline with explicitly injected collaborators.
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        completion: Arc<L>,
        clock: Arc<C>,
        defaults: GenerationDefaults,
    ) -> Self {
        Self {
            store,
            completion,
            clock,
            defaults,
        }
    }

    /// Runs plan, execute and reflect for `task_id`.
    ///
    /// `cancel` is checked before each stage and raced against each
    /// completion call.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] when a stage fails, step logging fails, or
    /// the run is cancelled. Every failure other than cancellation is also
    /// recorded as a failed step.
    pub async fn run(
        &self,
        task_id: &TaskId,
        request: &TaskRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        let result = self.run_stages(task_id, request, cancel).await;
        if let Err(err) = &result {
            if matches!(err, PipelineError::Cancelled) {
                debug!(task_id = %task_id, "task pipeline cancelled");
            } else {
                error!(task_id = %task_id, error = %err, "task pipeline failed");
                let step = self.failed_step(task_id, EXECUTION_FAILURE_STEP, &err.to_string());
                if let Err(log_err) = self.store.append_step(task_id, step).await {
                    warn!(task_id = %task_id, error = %log_err, "could not record pipeline failure");
                }
            }
        }
        result
    }

    async fn run_stages(
        &self,
        task_id: &TaskId,
        request: &TaskRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, PipelineError> {
        let initialization =
            StepLog::record(task_id, INITIALIZATION_STEP, StepStatus::Completed, &*self.clock)
                .with_message("Task execution started");
        self.store.append_step(task_id, initialization).await?;

        let mut state = PipelineState::new(request, &self.defaults);
        for stage in PipelineStage::ALL {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }
            let text = self.run_stage(task_id, stage, &state, cancel).await?;
            state.record(stage, text);
        }
        Ok(state.into_outcome())
    }

    async fn run_stage(
        &self,
        task_id: &TaskId,
        stage: PipelineStage,
        state: &PipelineState,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let running = StepLog::record(task_id, stage.step_name(), StepStatus::Running, &*self.clock)
            .with_message(stage.running_message());
        self.store.append_step(task_id, running).await?;
        debug!(task_id = %task_id, stage = %stage, "pipeline stage started");

        let result = match state.render_prompt(stage) {
            Ok(prompt) => self.complete(stage, state.completion_request(prompt), cancel).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(text) => {
                let completed =
                    StepLog::record(task_id, stage.step_name(), StepStatus::Completed, &*self.clock)
                        .with_message(stage.completion_message(&text));
                self.store.append_step(task_id, completed).await?;
                debug!(task_id = %task_id, stage = %stage, "pipeline stage completed");
                Ok(text)
            }
            Err(PipelineError::Cancelled) => Err(PipelineError::Cancelled),
            Err(err) => {
                let failed = self.failed_step(task_id, stage.step_name(), &err.to_string());
                self.store.append_step(task_id, failed).await?;
                Err(err)
            }
        }
    }

    async fn complete(
        &self,
        stage: PipelineStage,
        request: CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        tokio::select! {
            () = cancel.cancelled() => Err(PipelineError::Cancelled),
            result = self.completion.complete(request) => {
                result.map_err(|source| PipelineError::Completion { stage, source })
            }
        }
    }

    fn failed_step(&self, task_id: &TaskId, step_name: &str, error: &str) -> StepLog {
        StepLog::record(task_id, step_name, StepStatus::Failed, &*self.clock)
            .with_message(error)
            .with_error(error)
    }
}

//! Application services for task execution orchestration.

mod execution;
mod pipeline;
mod registry;

pub use execution::{TaskExecutionService, TaskServiceError, TaskServiceResult};
pub use pipeline::{
    EXECUTION_FAILURE_STEP, INITIALIZATION_STEP, PipelineError, PipelineOutcome, PipelineStage,
    TaskPipeline,
};
pub use registry::{ExecutionTicket, InFlightRegistry};

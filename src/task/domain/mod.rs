//! Domain model for task lifecycle management.
//!
//! The task domain models task records, their step logs, validated requests
//! and aggregate statistics while keeping storage and provider concerns
//! outside of the domain boundary.

mod error;
mod ids;
mod request;
mod statistics;
mod step;
mod task;

pub use error::{ParseTaskStatusError, StepLogError, TaskRequestError};
pub use ids::{StepId, TaskId};
pub use request::{GenerationDefaults, GenerationParameters, TaskRequest};
pub use statistics::TaskStatistics;
pub use step::{StepLog, StepStatus};
pub use task::{TaskMetadata, TaskRecord, TaskStatus, TaskStatusUpdate, elapsed_seconds};

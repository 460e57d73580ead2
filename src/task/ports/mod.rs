//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod completion;
pub mod store;

pub use completion::{CompletionClient, CompletionError, CompletionRequest, CompletionResult};
pub use store::{TaskStore, TaskStoreError, TaskStoreResult};

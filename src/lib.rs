//! TaskFlow: background execution of natural-language tasks.
//!
//! A submitted prompt runs through a plan, execute and reflect pipeline
//! against a chat-completion provider. Every stage is written to the task's
//! step log so clients can follow progress while the run is in flight.
//!
//! # Architecture
//!
//! TaskFlow follows hexagonal architecture principles:
//!
//! - **Domain**: task records, step logs and requests with no I/O
//! - **Ports**: the task store and completion client traits
//! - **Adapters**: in-memory storage, a scripted client and the `OpenAI` client
//!
//! # Modules
//!
//! - [`task`]: task lifecycle, pipeline and execution service
//! - [`api`]: HTTP routes over the execution service
//! - [`config`]: environment-driven settings
//! - [`telemetry`]: log subscriber installation

pub mod api;
pub mod config;
pub mod task;
pub mod telemetry;

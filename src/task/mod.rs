//! Task lifecycle management for TaskFlow.
//!
//! A submitted prompt becomes a task record that moves from `pending` to
//! `running` and on to `completed`, `failed` or `cancelled`. Each run passes
//! through a fixed plan, execute and reflect pipeline whose steps are logged
//! against the task. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;

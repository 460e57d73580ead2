//! Adapter implementations for the task store and completion ports.

pub mod memory;
pub mod openai;

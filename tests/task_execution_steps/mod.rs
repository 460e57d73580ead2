//! Step definitions for task execution scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;

//! Unit tests for the task module.
//!
//! Tests are organised by layer: domain values, the in-memory store, the
//! step pipeline and the execution service.

mod support;

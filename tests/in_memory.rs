//! In-memory integration tests.
//!
//! Tests are organized into modules by functionality:
//! - `task_store_tests`: record persistence, step logs and paging
//! - `execution_tests`: background execution, cancellation and deadlines

#![expect(clippy::expect_used, reason = "Test code uses expect for assertion clarity")]

mod in_memory {
    pub mod helpers;

    mod execution_tests;
    mod task_store_tests;
}

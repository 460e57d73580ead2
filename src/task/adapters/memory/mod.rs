//! In-memory adapter implementations.
//!
//! These adapters provide simple, thread-safe implementations suitable for
//! tests and for running the service without a durable backend.

mod completion;
mod store;

pub use completion::ScriptedCompletionClient;
pub use store::InMemoryTaskStore;

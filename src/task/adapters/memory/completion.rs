//! Scripted completion client for tests and offline runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::task::ports::{CompletionClient, CompletionError, CompletionRequest, CompletionResult};

/// Completion client that replays queued responses in order.
///
/// Each call pops the next scripted outcome and records the request it
/// received. When the script is exhausted, calls fail with
/// [`CompletionError::Unavailable`]. An optional delay is awaited before each
/// reply so callers can observe in-flight work.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCompletionClient {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: VecDeque<CompletionResult<String>>,
    requests: Vec<CompletionRequest>,
}

fn lock_error<T>(err: PoisonError<T>) -> CompletionError {
    CompletionError::Unavailable(err.to_string())
}

impl ScriptedCompletionClient {
    /// Creates a client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client that answers with `responses` in order.
    #[must_use]
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        if let Ok(mut state) = client.state.lock() {
            state
                .responses
                .extend(responses.into_iter().map(|text| Ok(text.into())));
        }
        client
    }

    /// Waits for `delay` before answering each call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queues a successful completion.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Unavailable`] when lock acquisition fails.
    pub fn push_response(&self, text: impl Into<String>) -> CompletionResult<()> {
        let mut state = self.state.lock().map_err(lock_error)?;
        state.responses.push_back(Ok(text.into()));
        Ok(())
    }

    /// Queues a failed completion.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Unavailable`] when lock acquisition fails.
    pub fn push_failure(&self, error: CompletionError) -> CompletionResult<()> {
        let mut state = self.state.lock().map_err(lock_error)?;
        state.responses.push_back(Err(error));
        Ok(())
    }

    /// Returns every request received so far.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Unavailable`] when lock acquisition fails.
    pub fn requests(&self) -> CompletionResult<Vec<CompletionRequest>> {
        let state = self.state.lock().map_err(lock_error)?;
        Ok(state.requests.clone())
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletionClient {
    async fn complete(&self, request: CompletionRequest) -> CompletionResult<String> {
        let next = {
            let mut state = self.state.lock().map_err(lock_error)?;
            state.requests.push(request);
            state.responses.pop_front()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        next.unwrap_or_else(|| {
            Err(CompletionError::Unavailable(
                "completion script exhausted".to_owned(),
            ))
        })
    }
}

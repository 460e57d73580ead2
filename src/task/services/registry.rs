//! Registry of task executions that are currently running.

use crate::task::domain::TaskId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;

/// Identifies one registration of a task.
///
/// A task identifier can be executed more than once; tickets keep a stale
/// execution from releasing a newer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutionTicket(u64);

#[derive(Debug)]
struct InFlightEntry {
    token: CancellationToken,
    abort: Option<AbortHandle>,
    ticket: ExecutionTicket,
}

impl InFlightEntry {
    fn stop(&self) {
        self.token.cancel();
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }
}

/// Concurrent map from task identifier to its cancellation handles.
///
/// Whoever removes an entry owns the task's terminal status: the execution
/// path when it finishes first, or the canceller otherwise.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    entries: Mutex<HashMap<TaskId, InFlightEntry>>,
    next_ticket: AtomicU64,
}

impl InFlightRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Entries hold no invariants a panicking holder could break.
    fn entries(&self) -> MutexGuard<'_, HashMap<TaskId, InFlightEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `task_id` with its cancellation token.
    ///
    /// A previous registration of the same identifier is replaced and
    /// stopped.
    pub fn register(&self, task_id: &TaskId, token: CancellationToken) -> ExecutionTicket {
        let ticket = ExecutionTicket(self.next_ticket.fetch_add(1, Ordering::Relaxed));
        let entry = InFlightEntry {
            token,
            abort: None,
            ticket,
        };
        if let Some(previous) = self.entries().insert(task_id.clone(), entry) {
            previous.stop();
        }
        ticket
    }

    /// Attaches the abort handle of the spawned execution.
    ///
    /// Returns `false` when the registration is already gone, in which case
    /// the caller should abort the execution itself.
    pub fn attach_abort(
        &self,
        task_id: &TaskId,
        ticket: ExecutionTicket,
        abort: AbortHandle,
    ) -> bool {
        match self.entries().get_mut(task_id) {
            Some(entry) if entry.ticket == ticket => {
                entry.abort = Some(abort);
                true
            }
            _ => false,
        }
    }

    /// Removes the registration identified by `ticket`.
    ///
    /// Returns `true` when this call removed it.
    pub fn release(&self, task_id: &TaskId, ticket: ExecutionTicket) -> bool {
        let mut entries = self.entries();
        match entries.get(task_id) {
            Some(entry) if entry.ticket == ticket => {
                entries.remove(task_id);
                true
            }
            _ => false,
        }
    }

    /// Removes the registration of `task_id` and stops its execution.
    ///
    /// Returns `false` when the task is not in flight.
    pub fn cancel(&self, task_id: &TaskId) -> bool {
        let removed = self.entries().remove(task_id);
        removed.is_some_and(|entry| {
            entry.stop();
            true
        })
    }

    /// Returns whether `task_id` is in flight.
    #[must_use]
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.entries().contains_key(task_id)
    }

    /// Returns the number of executions in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns whether no execution is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Releases a registration when dropped.
///
/// Dropping the guard without calling [`InFlightGuard::finish`] stops the
/// execution as well, so an abandoned caller never leaves work running.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    task_id: TaskId,
    ticket: ExecutionTicket,
    token: CancellationToken,
    abort: Option<AbortHandle>,
    finished: bool,
}

impl InFlightGuard {
    pub(crate) fn new(
        registry: Arc<InFlightRegistry>,
        task_id: TaskId,
        ticket: ExecutionTicket,
        token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            task_id,
            ticket,
            token,
            abort: None,
            finished: false,
        }
    }

    pub(crate) fn set_abort(&mut self, abort: AbortHandle) {
        self.abort = Some(abort);
    }

    /// Releases the registration and reports whether this guard owned it.
    pub(crate) fn finish(&mut self) -> bool {
        self.finished = true;
        self.registry.release(&self.task_id, self.ticket)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if self.registry.release(&self.task_id, self.ticket) {
            self.token.cancel();
            if let Some(abort) = &self.abort {
                abort.abort();
            }
        }
    }
}

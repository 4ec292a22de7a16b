//! Execution cancellation tracking.
//!
//! Every execution in flight is registered under a UUID. Cancelling it wakes
//! the execution loop, which abandons the HTTP call it is waiting on and
//! returns the exchanges recorded so far.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A handle to one execution that can be cancelled.
#[derive(Debug, Clone)]
pub struct CancellationHandle {
    /// Unique identifier for this execution.
    pub execution_id: String,
    state: Arc<CancelState>,
}

impl CancellationHandle {
    /// Creates a handle with a generated UUID.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    /// Creates a handle with a specific id.
    pub fn with_id(execution_id: impl Into<String>) -> Self {
        Self {
            execution_id: execution_id.into(),
            state: Arc::new(CancelState::default()),
        }
    }

    /// Checks if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Requests cancellation and wakes every waiter.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types for cancellation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CancelError {
    /// No execution with the given id is in flight.
    #[error("execution not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Default)]
struct TrackerState {
    active: HashMap<String, CancellationHandle>,
    order: Vec<String>,
}

/// Registry of in-flight executions, shared across tasks.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTracker {
    inner: Arc<Mutex<TrackerState>>,
}

impl ExecutionTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are inserted and removed whole, so a poisoned lock still guards
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new execution and returns its handle.
    pub fn register(&self) -> CancellationHandle {
        let handle = CancellationHandle::new();
        self.register_handle(handle.clone());
        handle
    }

    /// Registers an existing handle.
    pub fn register_handle(&self, handle: CancellationHandle) {
        let mut state = self.lock();
        state.order.push(handle.execution_id.clone());
        state.active.insert(handle.execution_id.clone(), handle);
    }

    /// Removes an execution once it finishes.
    ///
    /// Returns `true` if it was still registered.
    pub fn unregister(&self, execution_id: &str) -> bool {
        let mut state = self.lock();
        state.order.retain(|id| id != execution_id);
        state.active.remove(execution_id).is_some()
    }

    /// Cancels one execution by id.
    pub fn cancel(&self, execution_id: &str) -> Result<(), CancelError> {
        let handle = {
            let mut state = self.lock();
            state.order.retain(|id| id != execution_id);
            state
                .active
                .remove(execution_id)
                .ok_or_else(|| CancelError::NotFound(execution_id.to_string()))?
        };
        log::info!("Cancelling execution {}", execution_id);
        handle.cancel();
        Ok(())
    }

    /// Cancels every execution in flight and returns how many there were.
    pub fn cancel_all(&self) -> usize {
        let handles: Vec<CancellationHandle> = {
            let mut state = self.lock();
            state.order.clear();
            state.active.drain().map(|(_, handle)| handle).collect()
        };
        for handle in &handles {
            handle.cancel();
        }
        if !handles.is_empty() {
            log::info!("Cancelled {} in-flight executions", handles.len());
        }
        handles.len()
    }

    /// Number of executions in flight.
    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    /// Ids of executions in flight, oldest first.
    pub fn active_ids(&self) -> Vec<String> {
        self.lock().order.clone()
    }

    /// Checks if an execution is still in flight.
    pub fn is_active(&self, execution_id: &str) -> bool {
        self.lock().active.contains_key(execution_id)
    }
}

//! Hosting-process surface.
//!
//! [`Daemon`] wraps one [`ExecutionEngine`] and exposes the three operations a
//! client needs: a version handshake, request execution and direct session
//! variable writes. [`server`] puts them behind HTTP.

pub mod models;
pub mod server;

pub use models::{ExecuteResponse, HandshakeResponse, SetVariableRequest};
pub use server::{router, serve};

use crate::executor::{ExecutionContext, ExecutionEngine};
use crate::session::GLOBAL_HOST;
use std::sync::Arc;

pub const MAJOR_VERSION: u32 = 1;
pub const MINOR_VERSION: u32 = 0;

/// Shared handle to the engine behind the daemon.
#[derive(Clone)]
pub struct Daemon {
    engine: Arc<ExecutionEngine>,
}

impl Daemon {
    pub fn new(engine: ExecutionEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &Arc<ExecutionEngine> {
        &self.engine
    }

    /// Liveness and version probe.
    pub fn handshake(&self) -> HandshakeResponse {
        HandshakeResponse {
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
        }
    }

    /// Runs one execution. Failures are reported in the response, never
    /// raised.
    pub async fn execute_request(&self, context: ExecutionContext) -> ExecuteResponse {
        let outcome = self.engine.execute(&context).await;
        ExecuteResponse::from(outcome)
    }

    /// Writes a variable to a host's session, or the global one.
    pub fn set_variable(&self, request: &SetVariableRequest) {
        let host = request.host.as_deref().unwrap_or(GLOBAL_HOST);
        log::debug!("Setting variable {} for host '{}'", request.name, host);
        self.engine
            .sessions()
            .set_variable(host, &request.name, &request.value);
    }

    /// Cancels every execution in flight. Returns how many were cancelled.
    pub fn shutdown(&self) -> usize {
        self.engine.tracker().cancel_all()
    }
}

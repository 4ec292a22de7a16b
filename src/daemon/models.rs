//! Wire types of the daemon surface.

use crate::executor::ExecutionOutcome;
use crate::models::Exchange;
use serde::{Deserialize, Serialize};

/// Reply to a liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeResponse {
    pub major_version: u32,
    pub minor_version: u32,
}

/// Reply to an execution request.
///
/// Always carries the exchanges that completed, even when the execution
/// stopped on an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub exchanges: Vec<Exchange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Stable error kind such as `TransportError` or `RedirectLimitExceeded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl ExecuteResponse {
    /// A reply for an execution that never started.
    pub fn rejected(kind: &str, message: impl Into<String>) -> Self {
        Self {
            exchanges: Vec::new(),
            error_message: Some(message.into()),
            error_kind: Some(kind.to_string()),
        }
    }
}

impl From<ExecutionOutcome> for ExecuteResponse {
    fn from(outcome: ExecutionOutcome) -> Self {
        Self {
            exchanges: outcome.exchanges,
            error_kind: outcome.error.as_ref().map(|e| e.kind().to_string()),
            error_message: outcome.error.map(|e| e.to_string()),
        }
    }
}

/// Sets a session variable; without `host` it goes to the global session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetVariableRequest {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

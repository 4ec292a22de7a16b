//! Execution inputs and results.

use super::error::ExecutionError;
use crate::models::{AdhocRequest, Exchange, PostProcessSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Input to one run of the execution loop.
///
/// Optional bounds left unset fall back to the engine's configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// The caller's partially specified request.
    #[serde(default)]
    pub request: AdhocRequest,

    /// Named request template to start from; empty for none.
    #[serde(default)]
    pub request_name: String,

    /// Profiles to load and merge, in order.
    #[serde(default)]
    pub profile_names: Vec<String>,

    /// Variables passed by the caller; they take precedence over session and
    /// profile variables.
    #[serde(default, alias = "passedVariables")]
    pub variables: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_location: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_redirect: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_added_requests: Option<u32>,

    /// Script for the first request; replaces the template's script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_process_source: Option<PostProcessSource>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub allow_insecure: bool,
}

impl ExecutionContext {
    /// Creates a context for an ad-hoc request with everything else unset.
    pub fn new(request: AdhocRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    /// Starts from a named request template.
    pub fn with_request_name(mut self, name: impl Into<String>) -> Self {
        self.request_name = name.into();
        self
    }

    /// Adds a profile to merge after those already listed.
    pub fn with_profile(mut self, name: impl Into<String>) -> Self {
        self.profile_names.push(name.into());
        self
    }

    /// Passes a variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Sets the script run after the first request.
    pub fn with_post_process(mut self, source: PostProcessSource) -> Self {
        self.post_process_source = Some(source);
        self
    }
}

/// Result of one run of the execution loop.
///
/// Exchanges completed before a failure are always kept.
#[derive(Debug, Default)]
pub struct ExecutionOutcome {
    pub exchanges: Vec<Exchange>,
    pub error: Option<ExecutionError>,
}

impl ExecutionOutcome {
    pub(crate) fn completed(exchanges: Vec<Exchange>) -> Self {
        Self {
            exchanges,
            error: None,
        }
    }

    pub(crate) fn failed(exchanges: Vec<Exchange>, error: ExecutionError) -> Self {
        log::warn!(
            "Execution stopped after {} exchange(s): {}",
            exchanges.len(),
            error
        );
        Self {
            exchanges,
            error: Some(error),
        }
    }

    /// Whether the loop drained its queue without a terminal error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

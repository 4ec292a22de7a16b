//! Post-Process Hook.
//!
//! After each exchange the execution loop hands the request's script to a
//! [`ScriptHost`]. A script can read the exchange history, set variables on the
//! current host's session, enqueue more requests and print text. Nothing else
//! is exposed to it.

pub mod quickjs;

pub use quickjs::QuickJsScriptHost;

use crate::configure;
use crate::configure::url::{has_scheme, resolve_reference, splice_reference};
use crate::models::{AdhocRequest, Exchange, PostProcessSource, Request};
use crate::profile::Profile;
use crate::session::SessionStore;
use serde::Deserialize;
use std::sync::Arc;

/// Everything a script may touch for one exchange.
#[derive(Clone)]
pub struct ScriptBindings {
    /// Exchanges recorded so far in this execution, the current one last.
    pub executed: Vec<Exchange>,
    /// Host of the current request; `addVariable` writes to its session.
    pub host: String,
    /// Session store shared with the execution loop.
    pub sessions: Arc<dyn SessionStore>,
    /// Effective profile used to configure requests the script adds.
    pub profile: Arc<Profile>,
    /// URL the current request was sent to. Relative added URLs resolve
    /// against it.
    pub current_url: String,
}

impl ScriptBindings {
    /// The exchange the script runs for.
    pub fn current(&self) -> Option<&Exchange> {
        self.executed.last()
    }
}

impl std::fmt::Debug for ScriptBindings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptBindings")
            .field("executed", &self.executed.len())
            .field("host", &self.host)
            .field("current_url", &self.current_url)
            .finish()
    }
}

/// What a script run produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOutcome {
    /// Text printed with `print`/`println`.
    pub output: String,
    /// Fully configured requests to append to the queue, in call order.
    pub added_requests: Vec<Request>,
    /// Uncaught script error, if any.
    pub error: Option<String>,
}

/// Runs post-process scripts.
///
/// Implementations are synchronous; the execution loop runs them on a
/// blocking thread.
pub trait ScriptHost: Send + Sync {
    fn run(&self, source: &PostProcessSource, bindings: &ScriptBindings) -> ScriptOutcome;
}

/// A request enqueued by `addRequest`, before configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AddedRequest {
    /// `addRequest('/path')` or `addRequest('http://...')`.
    Url { url: String },
    /// `addRequest('@name')`.
    Named { name: String },
    /// `addRequest({ url: ..., method: ... })`.
    Object { request: serde_json::Value },
}

/// Raw results collected inside the script engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScriptReport {
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub variables: Vec<(String, String)>,
    #[serde(default)]
    pub requests: Vec<AddedRequest>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScriptReport {
    /// Applies the report: writes variables to the host session and configures
    /// added requests against the bindings' profile.
    ///
    /// A request that cannot be configured becomes the outcome's error when the
    /// script itself did not fail.
    pub fn into_outcome(self, bindings: &ScriptBindings) -> ScriptOutcome {
        for (name, value) in &self.variables {
            bindings.sessions.set_variable(&bindings.host, name, value);
        }

        let mut outcome = ScriptOutcome {
            output: self.output,
            added_requests: Vec::with_capacity(self.requests.len()),
            error: self.error,
        };

        for added in self.requests {
            match resolve_added_request(added, bindings) {
                Ok(request) => outcome.added_requests.push(request),
                Err(message) => {
                    log::warn!("Could not add request from script: {}", message);
                    outcome.error.get_or_insert(message);
                    break;
                }
            }
        }

        outcome
    }
}

/// Configures a request added by a script.
///
/// URL-only and object requests are configured without a template; `@name`
/// requests start from the named template and keep its script. A URL still
/// lacking a scheme afterwards resolves against the current request's URL;
/// placeholders in it survive for the substitution pass. A URL that starts
/// with a placeholder is left alone, since the placeholder may carry the origin.
pub fn resolve_added_request(
    added: AddedRequest,
    bindings: &ScriptBindings,
) -> Result<Request, String> {
    let (adhoc, template) = match added {
        AddedRequest::Url { url } => (AdhocRequest::for_url(url), String::new()),
        AddedRequest::Named { name } => (AdhocRequest::default(), name),
        AddedRequest::Object { request } => {
            let adhoc: AdhocRequest = serde_json::from_value(request)
                .map_err(|e| format!("invalid request object: {}", e))?;
            (adhoc, String::new())
        }
    };

    let mut request =
        configure::configure(&adhoc, &template, &bindings.profile).map_err(|e| e.to_string())?;

    if template.is_empty() {
        request.post_process = None;
    }
    if !has_scheme(&request.url) && !request.url.starts_with('{') {
        let resolved = if request.url.contains('{') {
            splice_reference(&bindings.current_url, &request.url)
        } else {
            resolve_reference(&bindings.current_url, &request.url)
        };
        request.url = resolved.map_err(|e| format!("cannot resolve '{}': {}", request.url, e))?;
    }

    Ok(request)
}

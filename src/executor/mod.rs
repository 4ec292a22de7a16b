//! Request execution loop.
//!
//! One execution configures a seed request from profiles, a named template and
//! the caller's ad-hoc fields, then drains a queue: every request is
//! substituted against the session of its host, sent, recorded as an
//! [`Exchange`], handed to its post-process script and, for 301/302/303
//! responses, followed by a GET to the `Location`. Scripts and redirects
//! append to the queue under per-execution limits.
//!
//! Errors never discard exchanges that already completed; they are returned
//! together in an [`ExecutionOutcome`].

pub mod cancellation;
pub mod context;
pub mod error;
pub mod native;
pub mod substitute;

pub use cancellation::{CancelError, CancellationHandle, ExecutionTracker};
pub use context::{ExecutionContext, ExecutionOutcome};
pub use error::{ConfigurationError, ExecutionError, RequestError};
pub use native::{send_request, Received};
pub use substitute::substitute_request;

use crate::config::EngineConfig;
use crate::configure::configure;
use crate::configure::url::{host_of, resolve_reference};
use crate::models::{Exchange, HttpMethod, PostProcessSource, Request};
use crate::postprocess::{QuickJsScriptHost, ScriptBindings, ScriptHost, ScriptOutcome};
use crate::profile::{Profile, ProfileLoader};
use crate::session::SessionStore;
use crate::variables::{merge_variables, replace_variables};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// Extra time granted to a script host past its own deadline before the loop
/// gives up waiting for it.
const SCRIPT_GRACE: Duration = Duration::from_millis(500);

/// Unregisters an execution from the tracker when dropped, including when the
/// execution future itself is dropped mid-flight.
struct Registration<'a> {
    tracker: &'a ExecutionTracker,
    execution_id: String,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.tracker.unregister(&self.execution_id);
    }
}

/// Runs executions against shared sessions and profiles.
///
/// The engine is cheap to share behind an `Arc`; concurrent executions only
/// contend on the session store.
pub struct ExecutionEngine {
    sessions: Arc<dyn SessionStore>,
    profiles: ProfileLoader,
    script_host: Arc<dyn ScriptHost>,
    config: EngineConfig,
    tracker: ExecutionTracker,
}

impl ExecutionEngine {
    /// Creates an engine with the QuickJS script host and the profile
    /// directory the configuration resolves to.
    pub fn new(config: EngineConfig, sessions: Arc<dyn SessionStore>) -> Self {
        let script_host = Arc::new(QuickJsScriptHost::new(
            config.script_timeout(),
            config.script_memory_limit,
        ));
        Self {
            sessions,
            profiles: ProfileLoader::new(config.resolved_profiles_dir()),
            script_host,
            config,
            tracker: ExecutionTracker::new(),
        }
    }

    /// Replaces the script host.
    pub fn with_script_host(mut self, script_host: Arc<dyn ScriptHost>) -> Self {
        self.script_host = script_host;
        self
    }

    /// Replaces the profile loader.
    pub fn with_profile_loader(mut self, profiles: ProfileLoader) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn profiles(&self) -> &ProfileLoader {
        &self.profiles
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executions currently in flight.
    pub fn tracker(&self) -> &ExecutionTracker {
        &self.tracker
    }

    /// Runs one execution, registered with the engine's tracker so it can be
    /// cancelled by id or by [`ExecutionTracker::cancel_all`].
    pub async fn execute(&self, context: &ExecutionContext) -> ExecutionOutcome {
        let handle = self.tracker.register();
        let _registration = Registration {
            tracker: &self.tracker,
            execution_id: handle.execution_id.clone(),
        };
        self.execute_with_cancel(context, &handle).await
    }

    /// Runs one execution that stops when `cancel` fires.
    ///
    /// Cancellation is observed while a request is in flight; the in-flight
    /// call is abandoned and the loop returns
    /// [`ExecutionError::Cancelled`] with the exchanges completed so far.
    pub async fn execute_with_cancel(
        &self,
        context: &ExecutionContext,
        cancel: &CancellationHandle,
    ) -> ExecutionOutcome {
        let mut exchanges: Vec<Exchange> = Vec::new();

        let profile = match self.profiles.load_and_merge(&context.profile_names) {
            Ok(profile) => Arc::new(profile),
            Err(e) => return ExecutionOutcome::failed(exchanges, e.into()),
        };

        let mut seed = match configure(&context.request, &context.request_name, &profile) {
            Ok(request) => request,
            Err(e) => return ExecutionOutcome::failed(exchanges, e.into()),
        };
        if let Some(source) = context.post_process_source.as_ref().filter(|s| !s.is_empty()) {
            seed.post_process = Some(source.clone());
        }
        seed.allow_insecure |= context.allow_insecure;

        let follow_location = context
            .follow_location
            .unwrap_or(self.config.follow_location);
        let max_redirect = context.max_redirect.unwrap_or(self.config.max_redirect);
        let max_added = context
            .max_added_requests
            .unwrap_or(self.config.max_added_requests);

        log::debug!(
            "Starting execution {} with {} profile(s)",
            cancel.execution_id,
            context.profile_names.len()
        );

        let mut queue = VecDeque::from([seed]);
        let mut redirect_count = 0u32;
        let mut added_count = 0u32;

        while let Some(pending) = queue.pop_front() {
            if cancel.is_cancelled() {
                return ExecutionOutcome::failed(exchanges, ExecutionError::Cancelled);
            }

            let (request, host) = self.prepare(&pending, context, &profile);
            log::debug!("Sending {} {}", request.method, request.url);

            let sent = tokio::select! {
                result = native::send_request(&request, self.config.http_timeout()) => result,
                _ = cancel.cancelled() => {
                    return ExecutionOutcome::failed(exchanges, ExecutionError::Cancelled);
                }
            };
            let received = match sent {
                Ok(received) => received,
                Err(e) => return ExecutionOutcome::failed(exchanges, e.into()),
            };
            log::info!(
                "{} {} -> {} ({} ms)",
                request.method,
                request.url,
                received.response.status_code,
                received.response.duration_ms
            );

            for cookie in received.cookies {
                self.sessions.set_cookie(&host, cookie);
            }

            let response = received.response;
            let redirect_target = if follow_location && response.is_followable_redirect() {
                response.location().map(str::to_string)
            } else {
                None
            };
            exchanges.push(Exchange::new(request.clone(), response));

            if let Some(source) = request.post_process.clone().filter(|s| !s.is_empty()) {
                let bindings = ScriptBindings {
                    executed: exchanges.clone(),
                    host: host.clone(),
                    sessions: Arc::clone(&self.sessions),
                    profile: Arc::clone(&profile),
                    current_url: request.url.clone(),
                };
                let outcome = self.run_script(source.clone(), bindings).await;

                let failed = match exchanges.last_mut() {
                    Some(exchange) => {
                        exchange.post_process_output = outcome.output;
                        exchange.post_process_error = outcome
                            .error
                            .map(|message| format!("{} @ {}", message, source.source_name));
                        exchange.post_process_error.is_some()
                    }
                    None => false,
                };
                if failed {
                    log::warn!("Post-process script {} failed", source.source_name);
                    break;
                }

                if !outcome.added_requests.is_empty() {
                    added_count += outcome.added_requests.len() as u32;
                    if added_count > max_added {
                        return ExecutionOutcome::failed(
                            exchanges,
                            ExecutionError::AddedRequestLimitExceeded {
                                count: added_count,
                                max: max_added,
                            },
                        );
                    }
                    log::debug!("Script added {} request(s)", outcome.added_requests.len());
                    queue.extend(outcome.added_requests);
                }
            }

            if let Some(location) = redirect_target {
                redirect_count += 1;
                if redirect_count > max_redirect {
                    return ExecutionOutcome::failed(
                        exchanges,
                        ExecutionError::RedirectLimitExceeded {
                            count: redirect_count,
                            max: max_redirect,
                        },
                    );
                }
                let target = match resolve_reference(&request.url, &location) {
                    Ok(target) => target,
                    Err(e) => {
                        return ExecutionOutcome::failed(exchanges, RequestError::from(e).into())
                    }
                };
                log::debug!("Following redirect to {}", target);
                let mut next = Request::new(HttpMethod::GET, target);
                next.allow_insecure = request.allow_insecure;
                queue.push_back(next);
            }
        }

        ExecutionOutcome::completed(exchanges)
    }

    /// Substitutes a queued request against its host's session.
    ///
    /// The host is found from the URL after substituting passed and profile
    /// variables only, since the session itself is keyed by that host.
    fn prepare(
        &self,
        pending: &Request,
        context: &ExecutionContext,
        profile: &Profile,
    ) -> (Request, String) {
        let first_pass = merge_variables(&[&context.variables, &profile.variables]);
        let host = host_of(&replace_variables(&pending.url, &first_pass)).unwrap_or_default();
        let session = self.sessions.get(&host);

        let variables =
            merge_variables(&[&context.variables, &session.variables, &profile.variables]);
        let mut request = substitute_request(pending, &variables);

        for cookie in session.live_cookies(Utc::now()) {
            if !request.cookies.iter().any(|c| c.name == cookie.name) {
                request.cookies.push(cookie);
            }
        }
        request.allow_insecure |= context.allow_insecure;

        let host = host_of(&request.url).unwrap_or(host);
        (request, host)
    }

    async fn run_script(&self, source: PostProcessSource, bindings: ScriptBindings) -> ScriptOutcome {
        let script_host = Arc::clone(&self.script_host);
        let budget = self.config.script_timeout() + SCRIPT_GRACE;
        let task = tokio::task::spawn_blocking(move || script_host.run(&source, &bindings));

        match tokio::time::timeout(budget, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => ScriptOutcome {
                error: Some(format!("script host failed: {}", e)),
                ..ScriptOutcome::default()
            },
            Err(_) => ScriptOutcome {
                error: Some(format!(
                    "script timed out after {} ms",
                    self.config.script_timeout_ms
                )),
                ..ScriptOutcome::default()
            },
        }
    }
}

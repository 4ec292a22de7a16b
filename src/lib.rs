//! Request Execution Engine for a command-line HTTP client
//!
//! Given a partially specified request plus named profiles (base URLs,
//! headers, variables, named request templates), the engine resolves a
//! concrete HTTP request, executes it, keeps per-host session state (cookies
//! and variables) across invocations, follows redirects, and lets a sandboxed
//! post-process script enqueue follow-up requests.
//!
//! # Architecture
//!
//! - **variables**: `{name}` placeholder discovery and substitution
//! - **session**: per-host cookies and variables layered over a global record
//! - **profile**: profile documents, imports and merging
//! - **auth**: `auth` blocks folded into an `Authorization` header
//! - **configure**: profile, template and ad-hoc fields folded into one request
//! - **executor**: the execution loop, HTTP transport and cancellation
//! - **postprocess**: the script host run after each exchange
//! - **config**: engine settings with defaults and validation
//! - **daemon**: the hosting-process surface served over HTTP
//! - **models**: requests, responses, cookies and exchanges
//!
//! # Example
//!
//! ```no_run
//! use http_cli::config::EngineConfig;
//! use http_cli::executor::{ExecutionContext, ExecutionEngine};
//! use http_cli::models::AdhocRequest;
//! use http_cli::session::MemorySessionStore;
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let engine = ExecutionEngine::new(EngineConfig::default(), Arc::new(MemorySessionStore::new()));
//! let context = ExecutionContext::new(AdhocRequest::for_url("https://api.example.com/users"))
//!     .with_profile("local");
//!
//! let outcome = engine.execute(&context).await;
//! for exchange in &outcome.exchanges {
//!     println!("{} {}", exchange.request.url, exchange.response.status);
//! }
//! if let Some(error) = outcome.error {
//!     eprintln!("{}: {}", error.kind(), error);
//! }
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod configure;
pub mod daemon;
pub mod executor;
pub mod models;
pub mod postprocess;
pub mod profile;
pub mod session;
pub mod variables;

pub use config::EngineConfig;
pub use executor::{ExecutionContext, ExecutionEngine, ExecutionError, ExecutionOutcome};
pub use models::{AdhocRequest, Exchange, Request, Response};
pub use session::{MemorySessionStore, SessionStore};

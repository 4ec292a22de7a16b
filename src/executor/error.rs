//! Execution error types.
//!
//! `RequestError` covers a single HTTP call; `ExecutionError` is the
//! loop-level taxonomy reported to callers alongside the exchanges that did
//! complete.

use crate::configure::ConfigureError;
use crate::profile::ProfileError;
use thiserror::Error;

/// Errors that can occur while sending one HTTP request.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Connection failures, DNS resolution errors and other network issues.
    #[error("Network error: {0}")]
    Network(String),

    /// The call took longer than the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// Certificate validation errors, handshake failures.
    #[error("TLS/SSL error: {0}")]
    Tls(String),

    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be built from the configured data.
    #[error("Request build error: {0}")]
    Build(String),
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::Build(message)
        } else if message.contains("certificate")
            || message.contains("TLS")
            || message.contains("SSL")
        {
            RequestError::Tls(message)
        } else {
            RequestError::Network(message)
        }
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        RequestError::InvalidUrl(err.to_string())
    }
}

/// Configuration failures: the request never reached the network.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Configure(#[from] ConfigureError),
}

/// Terminal conditions of one execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Bad or missing profile, unknown named request, bad method or URL.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// DNS, connection or TLS failure.
    #[error("transport error: {0}")]
    Transport(#[from] RequestError),

    /// More redirects than allowed.
    #[error("redirect limit exceeded: {count} redirects, maximum is {max}")]
    RedirectLimitExceeded { count: u32, max: u32 },

    /// Scripts added more requests than allowed.
    #[error("added request limit exceeded: {count} requests added, maximum is {max}")]
    AddedRequestLimitExceeded { count: u32, max: u32 },

    /// The execution was cancelled while a request was in flight.
    #[error("execution cancelled")]
    Cancelled,
}

impl ExecutionError {
    /// Stable identifier of the error kind, used on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Configuration(_) => "ConfigurationError",
            ExecutionError::Transport(_) => "TransportError",
            ExecutionError::RedirectLimitExceeded { .. } => "RedirectLimitExceeded",
            ExecutionError::AddedRequestLimitExceeded { .. } => "AddedRequestLimitExceeded",
            ExecutionError::Cancelled => "Cancelled",
        }
    }
}

impl From<ProfileError> for ExecutionError {
    fn from(err: ProfileError) -> Self {
        ExecutionError::Configuration(err.into())
    }
}

impl From<ConfigureError> for ExecutionError {
    fn from(err: ConfigureError) -> Self {
        ExecutionError::Configuration(err.into())
    }
}

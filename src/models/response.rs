//! HTTP response data models.
//!
//! This module defines the response side of an exchange and the `Exchange`
//! record the execution loop appends for every request it sends.

use super::request::{header_value, MultiMap, Request};
use serde::{Deserialize, Serialize};

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Status line text, e.g. `"302 Found"`.
    pub status: String,

    /// Protocol version the server answered with, e.g. `"HTTP/1.1"`.
    pub protocol: String,

    /// Response headers. A header sent several times keeps every value.
    pub headers: MultiMap,

    /// Response body decoded as UTF-8 (lossily for binary payloads).
    pub body: String,

    /// Wall-clock time from sending the request to reading the full body.
    #[serde(default)]
    pub duration_ms: u64,
}

impl Response {
    /// Creates a response with the given status and no headers or body.
    pub fn new(status_code: u16, status: impl Into<String>) -> Self {
        Self {
            status_code,
            status: status.into(),
            protocol: "HTTP/1.1".to_string(),
            headers: MultiMap::new(),
            body: String::new(),
            duration_ms: 0,
        }
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Whether the status is one the execution loop follows: 301, 302 or 303.
    pub fn is_followable_redirect(&self) -> bool {
        matches!(self.status_code, 301 | 302 | 303)
    }

    /// First `Location` header value, if any and non-empty.
    pub fn location(&self) -> Option<&str> {
        header_value(&self.headers, "location").filter(|l| !l.is_empty())
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        header_value(&self.headers, "content-type")
    }

    /// Appends a header value.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.entry(name.into()).or_default().push(value.into());
    }
}

/// One executed request paired with its response and post-process results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    /// The request exactly as it was sent, after substitution.
    pub request: Request,

    /// The response the server returned.
    pub response: Response,

    /// Text the post-process script printed.
    #[serde(default)]
    pub post_process_output: String,

    /// Uncaught script error, as `<message> @ <source name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_process_error: Option<String>,
}

impl Exchange {
    /// Creates an exchange with no post-process results yet.
    pub fn new(request: Request, response: Response) -> Self {
        Self {
            request,
            response,
            post_process_output: String::new(),
            post_process_error: None,
        }
    }
}

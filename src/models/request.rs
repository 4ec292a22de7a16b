//! HTTP request data models.
//!
//! `AdhocRequest` is the partially specified request a caller hands in (or a
//! post-process script builds); `Request` is the fully configured request the
//! execution loop sends.

use super::cookie::Cookie;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Multi-valued string map used for headers, query parameters and values.
pub type MultiMap = BTreeMap<String, Vec<String>>;

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Parses a method name, case-insensitively.
    ///
    /// Returns `None` for anything that is not a standard method.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            "TRACE" => Some(HttpMethod::TRACE),
            "CONNECT" => Some(HttpMethod::CONNECT),
            _ => None,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Source code of a post-process script and a label for error messages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostProcessSource {
    /// Script text.
    pub source_code: String,
    /// Where the script came from, e.g. a file path or
    /// `api.yml:requests.login.postProcessScript`.
    #[serde(default)]
    pub source_name: String,
}

impl PostProcessSource {
    /// Creates a source with the given code and label.
    pub fn new(source_code: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            source_name: source_name.into(),
        }
    }

    /// Whether there is any code to run.
    pub fn is_empty(&self) -> bool {
        self.source_code.trim().is_empty()
    }
}

/// A partially specified request.
///
/// Every field is optional in spirit: empty strings and empty maps mean "not set"
/// and let a named request template or profile fill the gap. Field names also
/// accept their capitalized form (`URL`, `Body`, ...) so that objects built by
/// post-process scripts decode the same way wire payloads do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdhocRequest {
    /// Method name; empty means infer it.
    #[serde(default, alias = "Method")]
    pub method: String,

    /// Absolute URL, or a path joined to the profile base URL.
    #[serde(default, alias = "URL", alias = "Url")]
    pub url: String,

    /// Raw body text.
    #[serde(default, alias = "Body")]
    pub body: String,

    /// Headers; a key set here replaces the template's and profile's values.
    #[serde(default, alias = "Headers")]
    pub headers: MultiMap,

    /// Free-form key/value pairs turned into a body or query parameters.
    #[serde(default, alias = "Values")]
    pub values: MultiMap,

    /// Cookies to send in addition to the session's.
    #[serde(default, alias = "Cookies")]
    pub cookies: Vec<Cookie>,

    /// Skip TLS certificate verification.
    #[serde(default, alias = "AllowInsecure")]
    pub allow_insecure: bool,
}

impl AdhocRequest {
    /// Creates an ad-hoc request for a URL, leaving everything else unset.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A fully configured HTTP request, ready for the execution loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// HTTP method.
    pub method: HttpMethod,

    /// Target URL. May still contain `{placeholders}` until the loop's
    /// substitution pass runs.
    pub url: String,

    /// Raw body; empty for none.
    #[serde(default)]
    pub body: String,

    /// Request headers, multi-valued.
    #[serde(default)]
    pub headers: MultiMap,

    /// Query parameters appended to the URL when the request is sent.
    #[serde(default)]
    pub query_params: MultiMap,

    /// Cookies sent with the request.
    #[serde(default)]
    pub cookies: Vec<Cookie>,

    /// Skip TLS certificate verification for this request.
    #[serde(default)]
    pub allow_insecure: bool,

    /// Script run after this request's exchange is recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_process: Option<PostProcessSource>,
}

impl Request {
    /// Creates a request with the given method and URL and nothing else.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: String::new(),
            headers: MultiMap::new(),
            query_params: MultiMap::new(),
            cookies: Vec::new(),
            allow_insecure: false,
            post_process: None,
        }
    }

    /// Appends a header value.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.entry(name.into()).or_default().push(value.into());
    }

    /// Checks if the request has a non-empty body.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

/// Looks up the first value of a header, case-insensitively.
pub fn header_value<'a>(headers: &'a MultiMap, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(|v| v.trim())
}

/// Gets the Content-Type value from a header map, case-insensitively.
pub fn content_type(headers: &MultiMap) -> Option<&str> {
    header_value(headers, "content-type").filter(|v| !v.is_empty())
}

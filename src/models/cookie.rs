//! HTTP cookie model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cookie received from a server or supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name; the session keys cookies by it.
    #[serde(alias = "Name")]
    pub name: String,

    /// Cookie value.
    #[serde(default, alias = "Value")]
    pub value: String,

    /// `Path` attribute, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// `Domain` attribute, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Absolute expiry, from `Expires` or `Max-Age`. `None` is a session cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,

    /// `Secure` attribute.
    #[serde(default)]
    pub secure: bool,

    /// `HttpOnly` attribute.
    #[serde(default)]
    pub http_only: bool,
}

impl Cookie {
    /// Creates a session cookie with no attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Whether the cookie's expiry is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |expires| expires <= now)
    }

    /// Renders the `name=value` pair used in a `Cookie` request header.
    pub fn to_header_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Joins cookies into a single `Cookie` header value, skipping expired ones.
///
/// Returns `None` when nothing is left to send.
pub fn cookie_header(cookies: &[Cookie], now: DateTime<Utc>) -> Option<String> {
    let pairs: Vec<String> = cookies
        .iter()
        .filter(|c| !c.is_expired_at(now))
        .map(Cookie::to_header_pair)
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

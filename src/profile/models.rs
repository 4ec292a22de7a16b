//! Profile data models.

use crate::models::{MultiMap, PostProcessSource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// A named, importable bundle of base URL, headers, variables and request templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Base URL relative request URLs are joined to.
    #[serde(default, rename = "baseURL")]
    pub base_url: String,

    /// Headers applied to every request; values accumulate across profiles.
    #[serde(default)]
    pub headers: MultiMap,

    /// Variables with the lowest substitution precedence.
    #[serde(default)]
    pub variables: HashMap<String, String>,

    /// Request templates keyed by name.
    #[serde(default)]
    pub named_requests: BTreeMap<String, NamedRequest>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub allow_insecure: bool,
}

impl Profile {
    /// Looks up a named request template.
    pub fn named_request(&self, name: &str) -> Option<&NamedRequest> {
        self.named_requests.get(name)
    }
}

/// A reusable, partially specified request stored in a profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRequest {
    #[serde(default)]
    pub body: String,

    /// File whose contents become the body. Already resolved against the
    /// profiles directory when loaded from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_to_upload: Option<PathBuf>,

    #[serde(default)]
    pub headers: MultiMap,

    #[serde(default)]
    pub method: String,

    #[serde(default)]
    pub url: String,

    /// Key/value pairs turned into a body or query parameters.
    #[serde(default)]
    pub values: MultiMap,

    /// Script run after this request executes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_process: Option<PostProcessSource>,
}

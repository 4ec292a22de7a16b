//! Building request bodies from free-form values.

use super::url::encode_form;
use crate::models::{HttpMethod, MultiMap};
use serde_json::{Map, Value};

/// MIME type used for bodies built from values when nothing else is declared.
pub const JSON_MIME_TYPE: &str = "application/json";

/// MIME type of URL-encoded form bodies.
pub const FORM_MIME_TYPE: &str = "application/x-www-form-urlencoded";

/// Whether a content type declares JSON.
pub fn is_json(content_type: &str) -> bool {
    content_type.trim().ends_with(JSON_MIME_TYPE)
}

/// Whether a content type declares a URL-encoded form.
pub fn is_form(content_type: &str) -> bool {
    content_type.trim().ends_with(FORM_MIME_TYPE)
}

/// Builds a flat JSON object from values.
///
/// When a key carries several values only the last one is kept. Keys come out
/// sorted.
///
/// # Examples
///
/// ```
/// use http_cli::configure::body::json_body;
/// use http_cli::models::MultiMap;
///
/// let mut values = MultiMap::new();
/// values.insert("name".to_string(), vec!["John".to_string()]);
/// values.insert("age".to_string(), vec!["19".to_string(), "20".to_string()]);
///
/// assert_eq!(json_body(&values), r#"{"age":"20","name":"John"}"#);
/// ```
pub fn json_body(values: &MultiMap) -> String {
    let object: Map<String, Value> = values
        .iter()
        .filter_map(|(key, vs)| vs.last().map(|v| (key.clone(), Value::String(v.clone()))))
        .collect();
    Value::Object(object).to_string()
}

/// Decides the final body.
///
/// Returns the body and whether it was built from `values`. GET requests never
/// carry a body; an explicit body always wins; otherwise values become a JSON
/// or form body when the content type asks for one.
pub fn build_body(
    method: HttpMethod,
    body: &str,
    values: &MultiMap,
    content_type: Option<&str>,
) -> (String, bool) {
    if method == HttpMethod::GET {
        return (String::new(), false);
    }
    if !body.is_empty() {
        return (body.to_string(), false);
    }
    if values.is_empty() {
        return (String::new(), false);
    }

    match content_type {
        Some(ct) if is_json(ct) => (json_body(values), true),
        Some(ct) if is_form(ct) => (encode_form(values), true),
        _ => (String::new(), false),
    }
}

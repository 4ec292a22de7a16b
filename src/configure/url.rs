//! URL joining and resolution helpers.

use crate::models::MultiMap;
use url::{form_urlencoded, Position, Url};

/// Whether `url` starts with a scheme such as `http://`.
///
/// Only the prefix is inspected, so templated URLs like
/// `https://{host}/api` still count as absolute.
pub fn has_scheme(url: &str) -> bool {
    match url.find("://") {
        Some(0) | None => false,
        Some(pos) => {
            let scheme = &url[..pos];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
    }
}

/// Joins a base URL and a path with exactly one `/` between them.
///
/// A path that already carries a scheme overrides the base entirely.
///
/// # Examples
///
/// ```
/// use http_cli::configure::url::join_url;
///
/// assert_eq!(join_url("http://localhost:3000/api/", "/users"), "http://localhost:3000/api/users");
/// assert_eq!(join_url("http://localhost:3000", "https://other/x"), "https://other/x");
/// ```
pub fn join_url(base: &str, path: &str) -> String {
    if has_scheme(path) || base.is_empty() {
        return path.to_string();
    }
    if path.is_empty() {
        return base.to_string();
    }

    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Resolves `reference` against `current`, the way a browser resolves a link.
///
/// An absolute reference is returned unchanged; `/b` keeps the scheme and host
/// of `current`.
pub fn resolve_reference(current: &str, reference: &str) -> Result<String, url::ParseError> {
    if has_scheme(reference) {
        return Ok(reference.to_string());
    }
    Ok(Url::parse(current)?.join(reference)?.to_string())
}

/// Resolves a reference that may still hold `{name}` placeholders.
///
/// The reference is spliced onto `current` as text so that placeholders are not
/// percent-encoded: `/x/{id}` keeps the origin of `current`, and `x/{id}`
/// replaces the last path segment. Query and fragment of `current` are dropped.
pub fn splice_reference(current: &str, reference: &str) -> Result<String, url::ParseError> {
    if has_scheme(reference) {
        return Ok(reference.to_string());
    }
    let parsed = Url::parse(current)?;
    let origin = &parsed[..Position::BeforePath];
    if reference.starts_with('/') {
        return Ok(format!("{}{}", origin, reference));
    }

    let path = parsed.path();
    let directory = match path.rfind('/') {
        Some(end) => &path[..=end],
        None => "/",
    };
    Ok(format!("{}{}{}", origin, directory, reference))
}

/// Host name of a URL, if it parses and has one.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Percent-encodes a multi-valued map as `application/x-www-form-urlencoded`.
pub fn encode_form(values: &MultiMap) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, values) in values {
        for value in values {
            serializer.append_pair(name, value);
        }
    }
    serializer.finish()
}

/// Parses a URL and appends query parameters after any query it already has.
pub fn with_query(url: &str, params: &MultiMap) -> Result<Url, url::ParseError> {
    let mut parsed = Url::parse(url)?;
    if params.values().any(|v| !v.is_empty()) {
        let mut pairs = parsed.query_pairs_mut();
        for (name, values) in params {
            for value in values {
                pairs.append_pair(name, value);
            }
        }
    }
    Ok(parsed)
}

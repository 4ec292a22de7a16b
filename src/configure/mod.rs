//! Request Configurator.
//!
//! Turns an ad-hoc request, an optional named template and the effective
//! profile into one fully specified [`Request`]. The three sources are
//! [`RequestFragment`]s folded in order profile, template, ad-hoc, so later
//! fragments win on scalar fields and replace header keys they set.

pub mod body;
pub mod url;

use crate::models::request::content_type;
use crate::models::{AdhocRequest, Cookie, HttpMethod, MultiMap, PostProcessSource, Request};
use crate::profile::{NamedRequest, Profile};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring a request.
#[derive(Debug, Error)]
pub enum ConfigureError {
    /// A named request was asked for but the profiles do not define it.
    #[error("request with name '{0}' not found")]
    RequestNotFound(String),

    /// The method is not a known HTTP method.
    #[error("invalid HTTP method: '{0}'")]
    InvalidMethod(String),

    /// No URL could be determined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The template's `fileToUpload` could not be read.
    #[error("failed to read file to upload {}: {source}", .path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template sets both `body` and `fileToUpload`.
    #[error("cannot set body and load it from a file at the same time")]
    BothBodyAndUpload,
}

/// One source of request fields.
#[derive(Debug, Clone, Copy)]
pub enum RequestFragment<'a> {
    /// Headers and `allowInsecure` from the effective profile.
    Profile(&'a Profile),
    /// A named request template.
    Template(&'a NamedRequest),
    /// The caller's ad-hoc request.
    Adhoc(&'a AdhocRequest),
}

/// Accumulated fields while folding fragments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestDraft {
    pub method: String,
    pub url: String,
    pub body: String,
    pub headers: MultiMap,
    pub values: MultiMap,
    pub cookies: Vec<Cookie>,
    pub allow_insecure: bool,
    pub post_process: Option<PostProcessSource>,
}

impl RequestDraft {
    /// Applies one fragment on top of what has been folded so far.
    pub fn apply(&mut self, fragment: RequestFragment<'_>) -> Result<(), ConfigureError> {
        match fragment {
            RequestFragment::Profile(profile) => {
                self.merge_headers(&profile.headers);
                self.allow_insecure |= profile.allow_insecure;
            }
            RequestFragment::Template(template) => {
                let body = template_body(template)?;
                self.merge_body(&body);
                self.merge_headers(&template.headers);
                self.merge_method(&template.method);
                self.merge_url(&template.url);
                self.merge_values(&template.values);
                if template.post_process.is_some() {
                    self.post_process = template.post_process.clone();
                }
            }
            RequestFragment::Adhoc(adhoc) => {
                self.merge_body(&adhoc.body);
                self.merge_headers(&adhoc.headers);
                self.merge_method(&adhoc.method);
                self.merge_url(&adhoc.url);
                self.merge_values(&adhoc.values);
                self.cookies.extend(adhoc.cookies.iter().cloned());
                self.allow_insecure |= adhoc.allow_insecure;
            }
        }
        Ok(())
    }

    fn merge_body(&mut self, body: &str) {
        if !body.is_empty() {
            self.body = body.to_string();
        }
    }

    fn merge_method(&mut self, method: &str) {
        if !method.trim().is_empty() {
            self.method = method.trim().to_string();
        }
    }

    fn merge_url(&mut self, url: &str) {
        if !url.is_empty() {
            self.url = url.to_string();
        }
    }

    fn merge_headers(&mut self, headers: &MultiMap) {
        for (name, values) in headers {
            self.headers.insert(name.clone(), values.clone());
        }
    }

    fn merge_values(&mut self, values: &MultiMap) {
        for (name, vs) in values {
            self.values.insert(name.clone(), vs.clone());
        }
    }
}

/// Folds fragments, in order, into a draft.
pub fn fold_fragments(fragments: &[RequestFragment<'_>]) -> Result<RequestDraft, ConfigureError> {
    let mut draft = RequestDraft::default();
    for fragment in fragments {
        draft.apply(*fragment)?;
    }
    Ok(draft)
}

fn template_body(template: &NamedRequest) -> Result<String, ConfigureError> {
    let Some(path) = &template.file_to_upload else {
        return Ok(template.body.clone());
    };
    if !template.body.is_empty() {
        return Err(ConfigureError::BothBodyAndUpload);
    }

    std::fs::read_to_string(path).map_err(|source| ConfigureError::Upload {
        path: path.clone(),
        source,
    })
}

/// Infers the method: the given one if set, else POST with a body, else GET.
pub fn infer_method(method: &str, has_body: bool) -> Result<HttpMethod, ConfigureError> {
    if method.is_empty() {
        return Ok(if has_body {
            HttpMethod::POST
        } else {
            HttpMethod::GET
        });
    }
    HttpMethod::parse(method).ok_or_else(|| ConfigureError::InvalidMethod(method.to_string()))
}

/// Merges an ad-hoc request, an optional template and the profile into a request.
///
/// # Arguments
///
/// * `adhoc` - The caller's request; its non-empty fields always win
/// * `template_name` - Named request to start from; empty for none
/// * `profile` - The effective (already merged) profile
///
/// # Returns
///
/// The configured request. Its URL and body may still hold `{placeholders}`
/// that the execution loop resolves once the session is known.
///
/// # Examples
///
/// ```
/// use http_cli::configure::configure;
/// use http_cli::models::{AdhocRequest, HttpMethod};
/// use http_cli::profile::Profile;
///
/// let mut adhoc = AdhocRequest::for_url("http://localhost/echo");
/// adhoc.body = "hi".to_string();
///
/// let request = configure(&adhoc, "", &Profile::default()).unwrap();
/// assert_eq!(request.method, HttpMethod::POST);
/// assert_eq!(request.content_type(), Some("application/json"));
/// ```
pub fn configure(
    adhoc: &AdhocRequest,
    template_name: &str,
    profile: &Profile,
) -> Result<Request, ConfigureError> {
    let template = if template_name.is_empty() {
        None
    } else {
        Some(
            profile
                .named_request(template_name)
                .ok_or_else(|| ConfigureError::RequestNotFound(template_name.to_string()))?,
        )
    };

    let mut fragments = vec![RequestFragment::Profile(profile)];
    if let Some(template) = template {
        fragments.push(RequestFragment::Template(template));
    }
    fragments.push(RequestFragment::Adhoc(adhoc));

    let mut draft = fold_fragments(&fragments)?;

    let has_body = !draft.body.is_empty();
    let has_values = !draft.values.is_empty();
    let method = infer_method(&draft.method, has_body)?;

    if content_type(&draft.headers).is_none()
        && (has_body || (has_values && method != HttpMethod::GET))
    {
        draft
            .headers
            .insert("Content-Type".to_string(), vec![body::JSON_MIME_TYPE.to_string()]);
    }

    let (final_body, from_values) = body::build_body(
        method,
        &draft.body,
        &draft.values,
        content_type(&draft.headers),
    );

    let full_url = url::join_url(&profile.base_url, &draft.url);
    if full_url.trim().is_empty() {
        return Err(ConfigureError::InvalidUrl(
            "no URL given and no base URL configured".to_string(),
        ));
    }

    let mut request = Request::new(method, full_url);
    request.body = final_body;
    request.headers = draft.headers;
    request.cookies = draft.cookies;
    request.allow_insecure = draft.allow_insecure;
    request.post_process = draft.post_process;
    if !from_values && has_values {
        request.query_params = draft.values;
    }

    log::debug!("Configured {} {}", request.method, request.url);
    Ok(request)
}

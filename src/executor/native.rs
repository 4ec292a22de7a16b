//! HTTP transport using reqwest.
//!
//! The client never follows redirects itself; the execution loop observes
//! every 3xx response and decides what to do with it.

use crate::configure::url::with_query;
use crate::executor::error::RequestError;
use crate::models::cookie::cookie_header;
use crate::models::{Cookie, HttpMethod, MultiMap, Request, Response};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

/// A response together with the cookies it set.
#[derive(Debug, Clone)]
pub struct Received {
    pub response: Response,
    pub cookies: Vec<Cookie>,
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::GET => reqwest::Method::GET,
        HttpMethod::POST => reqwest::Method::POST,
        HttpMethod::PUT => reqwest::Method::PUT,
        HttpMethod::DELETE => reqwest::Method::DELETE,
        HttpMethod::PATCH => reqwest::Method::PATCH,
        HttpMethod::HEAD => reqwest::Method::HEAD,
        HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
        HttpMethod::TRACE => reqwest::Method::TRACE,
        HttpMethod::CONNECT => reqwest::Method::CONNECT,
    }
}

/// Sends one fully substituted request.
///
/// # Arguments
///
/// * `request` - The request to send; query parameters are appended to the URL
///   and cookies become a `Cookie` header
/// * `timeout` - Overall timeout for the call; `None` waits indefinitely
pub async fn send_request(
    request: &Request,
    timeout: Option<Duration>,
) -> Result<Received, RequestError> {
    let start_time = Instant::now();
    let url = with_query(&request.url, &request.query_params)?;

    let mut client_builder = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .danger_accept_invalid_certs(request.allow_insecure);
    if let Some(timeout) = timeout {
        client_builder = client_builder.timeout(timeout);
    }
    let client = client_builder
        .build()
        .map_err(|e| RequestError::Build(e.to_string()))?;

    let mut req_builder = client.request(to_reqwest_method(request.method), url);

    for (name, values) in &request.headers {
        for value in values {
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }
    }
    if let Some(cookies) = cookie_header(&request.cookies, Utc::now()) {
        req_builder = req_builder.header(reqwest::header::COOKIE, cookies);
    }
    if request.has_body() {
        req_builder = req_builder.body(request.body.clone());
    }

    let response = req_builder.send().await?;

    let status = response.status();
    let mut received = Response::new(
        status.as_u16(),
        match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        },
    );
    received.protocol = format!("{:?}", response.version());
    received.headers = collect_headers(response.headers());

    let now = Utc::now();
    let cookies: Vec<Cookie> = response
        .cookies()
        .map(|c| from_reqwest_cookie(&c, now))
        .collect();

    let body = response.bytes().await?;
    received.body = String::from_utf8_lossy(&body).into_owned();
    received.duration_ms = start_time.elapsed().as_millis() as u64;

    Ok(Received {
        response: received,
        cookies,
    })
}

/// Response headers keyed by their canonical MIME form, e.g. `Content-Type`.
///
/// reqwest hands names over in lowercase; scripts and daemon clients read
/// them as `headers['Location']`.
fn collect_headers(headers: &reqwest::header::HeaderMap) -> MultiMap {
    let mut collected = MultiMap::new();
    for (name, value) in headers {
        collected
            .entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    collected
}

/// Upper-cases the first letter and every letter after a `-`, lower-cases the rest.
fn canonical_header_name(name: &str) -> String {
    let mut upper = true;
    name.chars()
        .map(|c| {
            let mapped = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            mapped
        })
        .collect()
}

fn from_reqwest_cookie(cookie: &reqwest::cookie::Cookie<'_>, now: DateTime<Utc>) -> Cookie {
    // Max-Age takes precedence over Expires.
    let expires = match cookie.max_age() {
        Some(max_age) => chrono::Duration::from_std(max_age)
            .ok()
            .map(|age| now + age),
        None => cookie.expires().map(DateTime::<Utc>::from),
    };

    Cookie {
        name: cookie.name().to_string(),
        value: cookie.value().to_string(),
        path: cookie.path().map(str::to_string),
        domain: cookie.domain().map(str::to_string),
        expires,
        secure: cookie.secure(),
        http_only: cookie.http_only(),
    }
}

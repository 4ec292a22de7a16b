//! Second-pass variable substitution over a configured request.

use crate::configure::body::is_form;
use crate::models::{MultiMap, Request};
use crate::variables::replace_variables;
use std::collections::HashMap;
use url::form_urlencoded;

/// Replaces placeholders in the URL, header values, query values and body.
///
/// URL-encoded form bodies are decoded pair by pair, so placeholders that were
/// percent-encoded when the body was built still resolve. Only pairs that
/// actually change are re-encoded; every other pair is sent byte for byte.
pub fn substitute_request(request: &Request, variables: &HashMap<String, String>) -> Request {
    let mut substituted = request.clone();
    substituted.url = replace_variables(&request.url, variables);
    substituted.headers = substitute_values(&request.headers, variables);
    substituted.query_params = substitute_values(&request.query_params, variables);
    substituted.body = match request.content_type() {
        Some(ct) if is_form(ct) => substitute_form(&request.body, variables),
        _ => replace_variables(&request.body, variables),
    };
    substituted
}

fn substitute_values(map: &MultiMap, variables: &HashMap<String, String>) -> MultiMap {
    map.iter()
        .map(|(key, values)| {
            (
                key.clone(),
                values
                    .iter()
                    .map(|v| replace_variables(v, variables))
                    .collect(),
            )
        })
        .collect()
}

fn substitute_form(body: &str, variables: &HashMap<String, String>) -> String {
    body.split('&')
        .map(|pair| {
            let Some((key, value)) = form_urlencoded::parse(pair.as_bytes()).next() else {
                return pair.to_string();
            };
            let new_key = replace_variables(&key, variables);
            let new_value = replace_variables(&value, variables);
            if new_key == key && new_value == value {
                return pair.to_string();
            }

            let mut encoded: String = form_urlencoded::byte_serialize(new_key.as_bytes()).collect();
            if pair.contains('=') {
                encoded.push('=');
                encoded.extend(form_urlencoded::byte_serialize(new_value.as_bytes()));
            }
            encoded
        })
        .collect::<Vec<_>>()
        .join("&")
}

//! Variable substitution engine.
//!
//! Replaces `{name}` placeholders with values from a lookup map. Placeholders whose
//! name is not in the map are left exactly as written so that a later pass, run with
//! a richer context (session variables only become known once the request host is),
//! can still resolve them. Substituted values are never re-scanned.

use super::find::find_variables;
use std::collections::HashMap;

/// Replaces every known placeholder in `template` with its value from `context`.
///
/// Text between placeholders, and any placeholder whose name is absent from
/// `context`, is copied verbatim.
///
/// # Examples
///
/// ```
/// use http_cli::variables::replace_variables;
/// use std::collections::HashMap;
///
/// let mut context = HashMap::new();
/// context.insert("host".to_string(), "api.example.com".to_string());
///
/// let result = replace_variables("https://{host}/users/{id}", &context);
/// assert_eq!(result, "https://api.example.com/users/{id}");
/// ```
pub fn replace_variables(template: &str, context: &HashMap<String, String>) -> String {
    let variables = find_variables(template);
    if variables.is_empty() {
        return template.to_string();
    }

    let mut result = String::with_capacity(template.len() + (template.len() / 4));
    let mut last_position = 0;

    for variable in variables {
        if let Some(value) = context.get(&variable.name) {
            result.push_str(&template[last_position..variable.start]);
            result.push_str(value);
            last_position = variable.end;
        }
    }

    result.push_str(&template[last_position..]);
    result
}

/// Merges variable maps into one lookup, first map wins on key collision.
///
/// Callers pass maps from highest to lowest precedence, e.g.
/// `merge_variables(&[&passed, &session, &profile])`.
pub fn merge_variables(sources: &[&HashMap<String, String>]) -> HashMap<String, String> {
    let mut result = HashMap::new();
    for source in sources.iter().rev() {
        for (key, value) in source.iter() {
            result.insert(key.clone(), value.clone());
        }
    }
    result
}

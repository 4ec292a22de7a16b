//! Placeholder discovery.
//!
//! Placeholders have the form `{name}` or `{name:tag}` where both `name` and `tag`
//! are word characters only. Braces do not nest, so matches never overlap.

use once_cell::sync::Lazy;
use regex::Regex;

/// Cached regex for `{name}` and `{name:tag}` placeholders.
static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(\w+)(?::(\w+))?\}").expect("Failed to compile variable regex")
});

/// A placeholder found in a string.
///
/// All offsets are byte offsets into the scanned string. `start..end` covers the
/// whole token including its braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Variable name, used as the lookup key.
    pub name: String,
    /// Optional tag after the colon, e.g. `number` in `{id:number}`.
    pub tag: Option<String>,
    /// Offset of the opening brace.
    pub start: usize,
    /// Offset one past the closing brace.
    pub end: usize,
    /// Offset of the first character of the name.
    pub name_start: usize,
    /// Offset one past the last character of the name.
    pub name_end: usize,
}

/// Finds every placeholder in `text`, scanning left to right.
///
/// # Examples
///
/// ```
/// use http_cli::variables::find_variables;
///
/// let vars = find_variables("GET {baseUrl}/users/{id:number}");
/// assert_eq!(vars.len(), 2);
/// assert_eq!(vars[0].name, "baseUrl");
/// assert_eq!(vars[1].tag.as_deref(), Some("number"));
/// ```
pub fn find_variables(text: &str) -> Vec<Variable> {
    // Fast path: no opening brace means nothing to scan
    if !text.contains('{') {
        return Vec::new();
    }

    VARIABLE_REGEX
        .captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?;
            Some(Variable {
                name: name.as_str().to_string(),
                tag: cap.get(2).map(|t| t.as_str().to_string()),
                start: whole.start(),
                end: whole.end(),
                name_start: name.start(),
                name_end: name.end(),
            })
        })
        .collect()
}

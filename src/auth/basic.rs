//! Basic HTTP authentication (RFC 7617).

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encodes username and password into a Basic authentication header value.
///
/// # Examples
///
/// ```
/// use http_cli::auth::basic::basic_auth;
///
/// let auth_header = basic_auth("myUsername", "myPassword");
/// assert_eq!(auth_header, "Basic bXlVc2VybmFtZTpteVBhc3N3b3Jk");
/// ```
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{}:{}", username, password);
    format!("Basic {}", STANDARD.encode(credentials.as_bytes()))
}

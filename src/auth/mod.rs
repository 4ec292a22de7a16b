//! Authorization blocks declared in profiles.
//!
//! A profile may declare an `auth` block instead of a literal `Authorization`
//! header. The block is validated when the profile loads and folded into the
//! profile's headers as a single `Authorization` value.

pub mod basic;
pub mod bearer;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Header name the authorization value is stored under.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Errors produced while validating an authorization block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The `type` is neither `basic` nor `bearer`.
    #[error("unsupported auth type: {0}")]
    UnsupportedType(String),

    /// Basic auth without a username or password.
    #[error("username and password must not be empty but were '{username}' and '{password}' respectively")]
    MissingCredentials { username: String, password: String },

    /// Bearer auth without a token.
    #[error("token must not be empty for bearer auth")]
    MissingToken,
}

/// An `auth` block as written in a profile document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// `basic` or `bearer`, case-insensitive.
    #[serde(rename = "type", default)]
    pub auth_type: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub token: String,
}

impl AuthConfig {
    /// Checks that the block names a supported scheme and carries its credentials.
    pub fn validate(&self) -> Result<(), AuthError> {
        match self.auth_type.to_lowercase().as_str() {
            "basic" => {
                if self.username.is_empty() || self.password.is_empty() {
                    return Err(AuthError::MissingCredentials {
                        username: self.username.clone(),
                        password: self.password.clone(),
                    });
                }
                Ok(())
            }
            "bearer" => {
                if self.token.is_empty() {
                    return Err(AuthError::MissingToken);
                }
                Ok(())
            }
            other => Err(AuthError::UnsupportedType(other.to_string())),
        }
    }

    /// Builds the `Authorization` header value for this block.
    ///
    /// # Examples
    ///
    /// ```
    /// use http_cli::auth::AuthConfig;
    ///
    /// let auth = AuthConfig {
    ///     auth_type: "Bearer".to_string(),
    ///     token: "abc".to_string(),
    ///     ..AuthConfig::default()
    /// };
    /// assert_eq!(auth.to_header_value().unwrap(), "Bearer abc");
    /// ```
    pub fn to_header_value(&self) -> Result<String, AuthError> {
        self.validate()?;

        if self.auth_type.eq_ignore_ascii_case("basic") {
            Ok(basic::basic_auth(&self.username, &self.password))
        } else {
            Ok(bearer::bearer_token(&self.token))
        }
    }
}

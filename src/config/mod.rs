//! Configuration loading and validation.
//!
//! Settings are merged over defaults and validated, then handed to the engine
//! and the daemon explicitly. There is no process-wide configuration.

pub mod schema;

pub use schema::{ConfigError, EngineConfig, PROFILES_DIR_ENV};

use serde_json::Value;

/// Key the engine's settings may be nested under in a larger settings document.
pub const SETTINGS_KEY: &str = "http-cli";

/// Loads configuration from a JSON settings value.
///
/// The settings may be the configuration object itself or a document holding
/// it under the `"http-cli"` key. Settings that fail to decode are logged and
/// replaced by defaults; the result is always validated.
///
/// # Example
///
/// ```
/// use http_cli::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "http-cli": {
///         "maxRedirect": 3,
///         "followLocation": false
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.max_redirect, 3);
/// assert!(!config.follow_location);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::default();

    if let Some(settings) = settings_json {
        let settings = match settings.get(SETTINGS_KEY) {
            Some(nested) => nested.clone(),
            None => settings,
        };

        match serde_json::from_value::<EngineConfig>(settings) {
            Ok(user_config) => config = user_config,
            Err(e) => {
                log::warn!("Failed to parse http-cli settings: {}. Using defaults.", e);
            }
        }
    }

    config.validate()?;
    Ok(config)
}

//! Configuration schema for the execution engine.
//!
//! Every field has a default, so an empty settings object is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the default profiles directory.
pub const PROFILES_DIR_ENV: &str = "HTTP_CLI_PROFILES";

/// Directory name, under the home directory, holding profiles by default.
pub const DEFAULT_PROFILES_DIR_NAME: &str = "http-cli";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has a value the engine cannot work with.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// The settings file could not be read.
    #[error("failed to read settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for this schema.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Settings for the execution engine and the daemon hosting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Directory holding profile documents.
    ///
    /// When unset, `HTTP_CLI_PROFILES` is consulted, then `<home>/http-cli`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles_dir: Option<PathBuf>,

    /// Overall timeout for one HTTP call, in milliseconds. Unset means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Wall-clock budget for one post-process script run, in milliseconds.
    #[serde(default = "default_script_timeout_ms")]
    pub script_timeout_ms: u64,

    /// Heap limit for one post-process script run, in bytes.
    #[serde(default = "default_script_memory_limit")]
    pub script_memory_limit: usize,

    /// Follow 301/302/303 responses when the execution context does not say.
    #[serde(default = "default_follow_location")]
    pub follow_location: bool,

    /// Redirects followed per execution when the context does not say.
    #[serde(default = "default_max_redirect")]
    pub max_redirect: u32,

    /// Script-added requests allowed per execution when the context does not say.
    #[serde(default = "default_max_added_requests")]
    pub max_added_requests: u32,

    /// Address the daemon listens on.
    #[serde(default = "default_daemon_address")]
    pub daemon_address: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            profiles_dir: None,
            timeout_ms: None,
            script_timeout_ms: default_script_timeout_ms(),
            script_memory_limit: default_script_memory_limit(),
            follow_location: default_follow_location(),
            max_redirect: default_max_redirect(),
            max_added_requests: default_max_added_requests(),
            daemon_address: default_daemon_address(),
        }
    }
}

impl EngineConfig {
    /// Validates the configuration.
    ///
    /// `maxRedirect` and `maxAddedRequests` may be 0, which turns the
    /// corresponding follow-ups into immediate limit errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "timeoutMs must be greater than 0".to_string(),
            ));
        }
        if self.script_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "scriptTimeoutMs must be greater than 0".to_string(),
            ));
        }
        if self.script_memory_limit == 0 {
            return Err(ConfigError::Invalid(
                "scriptMemoryLimit must be greater than 0".to_string(),
            ));
        }
        if self.daemon_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "daemonAddress must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Reads and validates a JSON settings file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// The profiles directory after applying the fallback chain.
    pub fn resolved_profiles_dir(&self) -> PathBuf {
        if let Some(dir) = &self.profiles_dir {
            return dir.clone();
        }
        if let Some(dir) = std::env::var_os(PROFILES_DIR_ENV).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_PROFILES_DIR_NAME)
    }

    /// HTTP call timeout, if any.
    pub fn http_timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Script run budget.
    pub fn script_timeout(&self) -> Duration {
        Duration::from_millis(self.script_timeout_ms)
    }
}

fn default_script_timeout_ms() -> u64 {
    5_000
}

fn default_script_memory_limit() -> usize {
    16 * 1024 * 1024
}

fn default_follow_location() -> bool {
    true
}

fn default_max_redirect() -> u32 {
    10
}

fn default_max_added_requests() -> u32 {
    10
}

fn default_daemon_address() -> String {
    "127.0.0.1:4321".to_string()
}

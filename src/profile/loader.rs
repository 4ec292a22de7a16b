//! Profile document loader.
//!
//! Profiles live as YAML (`.yml`, `.yaml`) or JSON (`.json`) documents in a
//! profiles directory and are referenced by file stem. A document is decoded
//! into a generic JSON tree first and then validated field by field, so both
//! formats share one set of rules.

use super::merge::merge_profiles;
use super::models::{NamedRequest, Profile};
use crate::auth::{AuthConfig, AuthError, AUTHORIZATION_HEADER};
use crate::models::{MultiMap, PostProcessSource};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions tried, in order, when a profile is referenced by bare name.
const PROFILE_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

/// Errors that can occur while loading profiles.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No document exists for the profile name.
    #[error("profile '{name}' not found, searched: {}", display_paths(.searched))]
    NotFound { name: String, searched: Vec<PathBuf> },

    /// The document or directory could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or JSON.
    #[error("failed to decode profile {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    /// The document decoded but a field has the wrong shape.
    #[error("invalid profile {}: {message}", .path.display())]
    InvalidFormat { path: PathBuf, message: String },

    /// A profile imports itself, directly or through other profiles.
    #[error("profile import cycle: {}", .0.join(" -> "))]
    ImportCycle(Vec<String>),

    /// The `auth` block is invalid.
    #[error("invalid auth in profile {}: {source}", .path.display())]
    Auth {
        path: PathBuf,
        #[source]
        source: AuthError,
    },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loads profiles by name from a directory.
#[derive(Debug, Clone)]
pub struct ProfileLoader {
    dir: PathBuf,
}

impl ProfileLoader {
    /// Creates a loader for the given profiles directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The profiles directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads one profile, with its imports merged in before its own fields.
    ///
    /// # Arguments
    ///
    /// * `name` - File stem, or a file name carrying a `.yml`, `.yaml` or
    ///   `.json` extension
    ///
    /// # Returns
    ///
    /// The effective profile, or a `ProfileError` if the document or any of its
    /// imports is missing, malformed or cyclic.
    pub fn load_profile(&self, name: &str) -> Result<Profile, ProfileError> {
        self.load_with_chain(name, &mut Vec::new())
    }

    /// Loads every named profile and merges them in the order given.
    ///
    /// An empty list yields an empty profile without touching the filesystem.
    pub fn load_and_merge(&self, names: &[String]) -> Result<Profile, ProfileError> {
        let profiles = names
            .iter()
            .map(|name| self.load_profile(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(merge_profiles(&profiles))
    }

    /// Lists the names of the profiles in the directory, sorted.
    pub fn available_profiles(&self) -> Result<Vec<String>, ProfileError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ProfileError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_profile_extension(path))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();

        names.sort();
        names.dedup();
        Ok(names)
    }

    fn load_with_chain(&self, name: &str, chain: &mut Vec<String>) -> Result<Profile, ProfileError> {
        let path = self.locate(name)?;
        let key = path.display().to_string();

        if chain.contains(&key) {
            let mut cycle = chain.clone();
            cycle.push(key);
            return Err(ProfileError::ImportCycle(cycle));
        }

        log::debug!("Loading profile '{}' from {}", name, path.display());
        let raw = read_document(&path)?;
        let document = parse_profile_document(&raw, &path, &self.dir)?;

        chain.push(key);
        let mut layers = Vec::with_capacity(document.imports.len() + 1);
        for import in &document.imports {
            log::debug!("Profile '{}' imports '{}'", name, import);
            layers.push(self.load_with_chain(import, chain)?);
        }
        chain.pop();

        layers.push(document.profile);
        Ok(merge_profiles(&layers))
    }

    fn locate(&self, name: &str) -> Result<PathBuf, ProfileError> {
        let candidate = self.dir.join(name);
        let searched = if has_profile_extension(&candidate) {
            vec![candidate]
        } else {
            PROFILE_EXTENSIONS
                .iter()
                .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
                .collect()
        };

        searched
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| ProfileError::NotFound {
                name: name.to_string(),
                searched,
            })
    }
}

fn has_profile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            PROFILE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

fn read_document(path: &Path) -> Result<Value, ProfileError> {
    let content = fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Value::Null);
    }

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let decoded = if is_json {
        serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
    };

    decoded.map_err(|message| ProfileError::Decode {
        path: path.to_path_buf(),
        message,
    })
}

/// A decoded profile document before its imports are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileDocument {
    /// Names of the profiles to merge in before this one.
    pub imports: Vec<String>,
    /// The document's own fields.
    pub profile: Profile,
}

/// Validates a decoded profile document.
///
/// # Arguments
///
/// * `raw` - The decoded document tree
/// * `path` - Where the document came from, used in error messages and script
///   source names
/// * `base_dir` - Directory relative `fileToUpload` paths are resolved against
pub fn parse_profile_document(
    raw: &Value,
    path: &Path,
    base_dir: &Path,
) -> Result<ProfileDocument, ProfileError> {
    let invalid = |message: String| ProfileError::InvalidFormat {
        path: path.to_path_buf(),
        message,
    };

    let obj = match raw {
        Value::Null => return Ok(ProfileDocument::default()),
        Value::Object(obj) => obj,
        _ => return Err(invalid("root must be a mapping".to_string())),
    };

    let mut document = ProfileDocument::default();
    let mut auth = None;

    for (key, value) in obj {
        match key.as_str() {
            "baseURL" | "baseUrl" => {
                document.profile.base_url = scalar_to_string(value)
                    .ok_or_else(|| invalid(format!("'{}' must be a string", key)))?;
            }
            "headers" => {
                document.profile.headers = parse_multimap(value, "headers").map_err(invalid)?;
            }
            "variables" => {
                document.profile.variables = parse_variables(value).map_err(invalid)?;
            }
            "import" => {
                document.imports = string_or_list(value, "import").map_err(invalid)?;
            }
            "allowInsecure" => {
                document.profile.allow_insecure = value
                    .as_bool()
                    .ok_or_else(|| invalid("'allowInsecure' must be a boolean".to_string()))?;
            }
            "auth" => {
                let config: AuthConfig = serde_json::from_value(value.clone())
                    .map_err(|e| invalid(format!("'auth': {}", e)))?;
                auth = Some(config);
            }
            "requests" => {
                document.profile.named_requests =
                    parse_requests(value, path, base_dir).map_err(invalid)?;
            }
            other => {
                log::debug!("Ignoring unknown profile key '{}' in {}", other, path.display());
            }
        }
    }

    if let Some(auth) = auth.filter(|a| !a.auth_type.is_empty()) {
        let value = auth.to_header_value().map_err(|source| ProfileError::Auth {
            path: path.to_path_buf(),
            source,
        })?;
        document
            .profile
            .headers
            .insert(AUTHORIZATION_HEADER.to_string(), vec![value]);
    }

    Ok(document)
}

fn parse_requests(
    value: &Value,
    path: &Path,
    base_dir: &Path,
) -> Result<std::collections::BTreeMap<String, NamedRequest>, String> {
    let mut requests = std::collections::BTreeMap::new();

    match value {
        Value::Null => {}
        Value::Object(obj) => {
            for (name, request) in obj {
                requests.insert(name.clone(), parse_request(name, request, path, base_dir)?);
            }
        }
        // Older documents list requests with an inline `name`.
        Value::Array(items) => {
            for request in items {
                let name = request
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "each entry of 'requests' needs a 'name'".to_string())?;
                requests.insert(name.to_string(), parse_request(name, request, path, base_dir)?);
            }
        }
        _ => return Err("'requests' must be a mapping".to_string()),
    }

    Ok(requests)
}

fn parse_request(
    name: &str,
    value: &Value,
    path: &Path,
    base_dir: &Path,
) -> Result<NamedRequest, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| format!("request '{}' must be a mapping", name))?;

    let mut request = NamedRequest::default();
    let field = |key: &str, v: &Value| {
        scalar_to_string(v).ok_or_else(|| format!("requests.{}.{} must be a string", name, key))
    };

    for (key, v) in obj {
        match key.as_str() {
            "body" => request.body = field(key, v)?,
            "method" => request.method = field(key, v)?,
            "url" | "URL" => request.url = field(key, v)?,
            "headers" => {
                request.headers = parse_multimap(v, &format!("requests.{}.headers", name))?
            }
            "values" => request.values = parse_multimap(v, &format!("requests.{}.values", name))?,
            "fileToUpload" => {
                let file = PathBuf::from(field(key, v)?);
                if !file.as_os_str().is_empty() {
                    request.file_to_upload = Some(if file.is_absolute() {
                        file
                    } else {
                        base_dir.join(file)
                    });
                }
            }
            "postProcessScript" => {
                let code = field(key, v)?;
                if !code.trim().is_empty() {
                    request.post_process = Some(PostProcessSource::new(
                        code,
                        format!("{}:requests.{}.postProcessScript", path.display(), name),
                    ));
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

/// Stringifies a scalar; `None` for sequences and mappings.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn string_or_list(value: &Value, context: &str) -> Result<Vec<String>, String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                scalar_to_string(item)
                    .ok_or_else(|| format!("'{}' entries must be strings", context))
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        other => scalar_to_string(other)
            .map(|s| vec![s])
            .ok_or_else(|| format!("'{}' must be a string or a list of strings", context)),
    }
}

fn parse_multimap(value: &Value, context: &str) -> Result<MultiMap, String> {
    match value {
        Value::Null => Ok(MultiMap::new()),
        Value::Object(obj) => obj
            .iter()
            .map(|(key, v)| {
                string_or_list(v, &format!("{}.{}", context, key)).map(|vs| (key.clone(), vs))
            })
            .collect(),
        _ => Err(format!("'{}' must be a mapping", context)),
    }
}

fn parse_variables(value: &Value) -> Result<HashMap<String, String>, String> {
    match value {
        Value::Null => Ok(HashMap::new()),
        Value::Object(obj) => obj
            .iter()
            .map(|(key, v)| {
                scalar_to_string(v)
                    .map(|s| (key.clone(), s))
                    .ok_or_else(|| format!("variable '{}' must be a scalar", key))
            })
            .collect(),
        _ => Err("'variables' must be a mapping".to_string()),
    }
}

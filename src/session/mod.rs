//! Per-host session state shared across executions.
//!
//! A session holds the cookies and variables collected for one host. One extra
//! record, keyed by the empty string, is the global session: its entries apply
//! to every host unless the host has its own entry with the same key.

use crate::models::Cookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Host key of the global session.
pub const GLOBAL_HOST: &str = "";

/// Cookies and variables for one host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Host name, or empty for the global session.
    pub host: String,

    /// Cookies keyed by name.
    pub cookies: BTreeMap<String, Cookie>,

    /// Variables collected by scripts or set by callers.
    pub variables: HashMap<String, String>,
}

impl Session {
    /// Creates an empty session for a host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Cookies that have not expired at `now`, in name order.
    pub fn live_cookies(&self, now: DateTime<Utc>) -> Vec<Cookie> {
        self.cookies
            .values()
            .filter(|c| !c.is_expired_at(now))
            .cloned()
            .collect()
    }

    /// Returns this session layered over `global`: own entries win on key collision.
    fn layered_over(&self, global: &Session) -> Session {
        let mut merged = global.clone();
        merged.host = self.host.clone();
        merged
            .cookies
            .extend(self.cookies.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
            .variables
            .extend(self.variables.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Storage for session records.
///
/// Implementations must be safe to call from concurrent executions. Writers
/// always target the underlying per-host record, never the merged view `get`
/// returns.
pub trait SessionStore: Send + Sync {
    /// Returns the host's session merged with the global session.
    ///
    /// Creates an empty record for the host on first access.
    fn get(&self, host: &str) -> Session;

    /// Sets a variable on a host's record.
    fn set_variable(&self, host: &str, name: &str, value: &str);

    /// Sets a variable on the global record.
    fn set_global_variable(&self, name: &str, value: &str) {
        self.set_variable(GLOBAL_HOST, name, value);
    }

    /// Stores a cookie on a host's record, replacing any cookie with the same name.
    ///
    /// A cookie that is already expired removes the stored one instead.
    fn set_cookie(&self, host: &str, cookie: Cookie);
}

/// In-memory session store guarded by a single mutex.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, including the global one once created.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no record has been created yet.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // Every write replaces whole entries, so a poisoned lock still guards
    // consistent data.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, host: &str) -> Session {
        let mut sessions = self.lock();
        let own = sessions
            .entry(host.to_string())
            .or_insert_with(|| Session::new(host))
            .clone();

        if host == GLOBAL_HOST {
            return own;
        }

        match sessions.get(GLOBAL_HOST) {
            Some(global) => own.layered_over(global),
            None => own,
        }
    }

    fn set_variable(&self, host: &str, name: &str, value: &str) {
        log::debug!("Setting variable '{}' for host '{}'", name, host);
        self.lock()
            .entry(host.to_string())
            .or_insert_with(|| Session::new(host))
            .variables
            .insert(name.to_string(), value.to_string());
    }

    fn set_cookie(&self, host: &str, cookie: Cookie) {
        let mut sessions = self.lock();
        let session = sessions
            .entry(host.to_string())
            .or_insert_with(|| Session::new(host));

        if cookie.is_expired_at(Utc::now()) {
            log::debug!("Removing expired cookie '{}' for host '{}'", cookie.name, host);
            session.cookies.remove(&cookie.name);
        } else {
            session.cookies.insert(cookie.name.clone(), cookie);
        }
    }
}

//! Environment snapshot.
//!
//! Backend credentials and endpoints come from environment variables. The
//! gateway reads them through a [`GatewayEnv`] snapshot so resolution is a
//! pure function of its input.

use std::collections::HashMap;
use tracing::debug;

/// Snapshot of environment variables
#[derive(Debug, Clone, Default)]
pub struct GatewayEnv {
    vars: HashMap<String, String>,
}

impl GatewayEnv {
    /// Load `.env` (if present) and snapshot the process environment
    #[must_use]
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => debug!(error = %e, "Ignoring unreadable .env file"),
        }
        Self::from_process()
    }

    /// Snapshot the process environment without reading `.env`
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build a snapshot from explicit pairs
    pub fn from_vars<K, V, I>(vars: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set a variable
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Look up a variable; empty values count as unset
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Whether a flag variable is set to `1`
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("1")
    }
}

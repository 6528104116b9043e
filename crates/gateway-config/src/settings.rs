//! Gateway settings.
//!
//! Settings have working defaults and can be loaded from a TOML file, then
//! overridden from the environment:
//!
//! ```toml
//! max_concurrency = 4
//! request_timeout = "2m"
//!
//! [retry]
//! max_attempts = 3
//! initial_delay = "1s"
//! max_delay = "10s"
//!
//! [default_args]
//! temperature = 0.0
//! ```

use crate::env::GatewayEnv;
use crate::error::ConfigError;
use gateway_core::BackendArgs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Overrides `max_concurrency`
pub const ENV_MAX_CONCURRENCY: &str = "GATEWAY_MAX_CONCURRENCY";
/// Overrides `retry.max_attempts`
pub const ENV_MAX_ATTEMPTS: &str = "GATEWAY_MAX_ATTEMPTS";

/// Retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per logical request, including the first
    pub max_attempts: u32,
    /// Sleep after the first failed attempt
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Upper bound for the doubled delay
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Gateway settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Maximum concurrent logical requests per gateway
    pub max_concurrency: usize,
    /// Retry policy
    pub retry: RetrySettings,
    /// HTTP timeout for a single backend call
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Generation cap sent to Anthropic-style backends when the caller gives none
    pub anthropic_max_tokens: u32,
    /// Arguments applied to every request (request arguments win)
    pub default_args: BackendArgs,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            retry: RetrySettings::default(),
            request_timeout: Duration::from_secs(600),
            anthropic_max_tokens: 32_768,
            default_args: BackendArgs::new(),
        }
    }
}

impl GatewaySettings {
    /// Parse settings from TOML
    ///
    /// # Errors
    /// Returns error if the TOML is malformed or a value is invalid
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = tokio::fs::read_to_string(path).await?;
        debug!(path = %path.display(), "Loaded gateway settings file");
        Self::from_toml_str(&contents)
    }

    /// Apply environment overrides
    ///
    /// # Errors
    /// Returns error if an override is not a valid number
    pub fn with_env_overrides(mut self, env: &GatewayEnv) -> Result<Self, ConfigError> {
        if let Some(raw) = env.get(ENV_MAX_CONCURRENCY) {
            self.max_concurrency = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_MAX_CONCURRENCY, format!("{e}")))?;
        }
        if let Some(raw) = env.get(ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_MAX_ATTEMPTS, format!("{e}")))?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns error if a value is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::invalid("max_concurrency", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.anthropic_max_tokens == 0 {
            return Err(ConfigError::invalid("anthropic_max_tokens", "must be at least 1"));
        }
        Ok(())
    }
}

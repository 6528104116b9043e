//! Configuration errors.

use gateway_core::GatewayError;
use thiserror::Error;

/// Errors raised while loading settings or resolving a backend
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing or empty
    #[error("{name} must be set: {reason}")]
    MissingVar {
        /// Variable name
        name: String,
        /// Why it is required
        reason: String,
    },

    /// A URL could not be parsed
    #[error("invalid URL in {name}: {message}")]
    InvalidUrl {
        /// Where the URL came from
        name: String,
        /// Parser message
        message: String,
    },

    /// A value is out of range or malformed
    #[error("invalid value for {name}: {message}")]
    InvalidValue {
        /// Setting or variable name
        name: String,
        /// Description
        message: String,
    },

    /// The settings file could not be parsed
    #[error("failed to parse settings: {0}")]
    Parse(String),

    /// The settings file could not be read
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn missing(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MissingVar {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

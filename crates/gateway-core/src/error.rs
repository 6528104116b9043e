//! Error types for the completion gateway.
//!
//! Two layers:
//! - [`BackendError`] is what a single backend attempt fails with. Every
//!   variant is retryable; the retry engine treats them uniformly.
//! - [`GatewayError`] is what callers of the gateway see.

use thiserror::Error;

/// Result alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Failure of one backend attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not be reached or replied with a non-success status
    #[error("transport error{}: {message}", status_suffix(.status))]
    Transport {
        /// HTTP status code, if a response was received
        status: Option<u16>,
        /// Error description
        message: String,
    },

    /// The backend replied but the reply broke the request's contract
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// Request content could not be encoded for the wire
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl BackendError {
    /// Create a transport error
    pub fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create a contract violation
    pub fn contract(message: impl Into<String>) -> Self {
        Self::ContractViolation(message.into())
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    /// Short label for logs and metrics
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::ContractViolation(_) => "contract_violation",
            Self::Encoding(_) => "encoding",
        }
    }
}

/// Errors returned by the gateway facade
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Every attempt failed; carries the last backend error unchanged
    #[error("completion failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// The most recent backend failure
        #[source]
        source: BackendError,
    },

    /// The request breaks an invariant and was never sent
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the violated invariant
        message: String,
    },

    /// The gateway could not be configured
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration issue
        message: String,
    },

    /// A JSON result could not be converted into the caller's type
    #[error("failed to deserialize completion: {message}")]
    Deserialize {
        /// Deserializer message
        message: String,
    },

    /// Internal failure
    #[error("internal error: {message}")]
    Internal {
        /// Description
        message: String,
    },
}

impl GatewayError {
    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The backend error behind an exhausted retry budget, if any
    #[must_use]
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::RetriesExhausted { source, .. } => Some(source),
            _ => None,
        }
    }
}

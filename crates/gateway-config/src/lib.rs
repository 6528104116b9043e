//! # Gateway Config
//!
//! Settings, environment snapshot and backend resolution for the completion
//! gateway.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod backend;
pub mod env;
pub mod error;
pub mod settings;

pub use backend::{resolve_backend, BackendTarget};
pub use env::GatewayEnv;
pub use error::ConfigError;
pub use settings::{GatewaySettings, RetrySettings};

//! # Gateway Telemetry
//!
//! Observability for the completion gateway.
//!
//! This crate provides:
//! - An in-memory usage and latency monitor
//! - Prometheus metrics
//! - Structured logging setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;
pub mod usage;

// Re-export main types
pub use error::TelemetryError;
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{FanoutSink, PrometheusSink};
pub use usage::{LatencyStats, TokenTotals, UsageMonitor, UsageRecord, UsageSnapshot};

//! # Gateway Resilience
//!
//! Resilience patterns for the completion gateway:
//! - Retry policy with exponential backoff
//! - Concurrency gate bounding in-flight requests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod gate;
pub mod retry;

// Re-export main types
pub use gate::{ConcurrencyGate, GatePermit};
pub use retry::{RetryConfig, RetryPolicy, RetryPolicyBuilder};

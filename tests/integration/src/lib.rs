//! Integration tests for the completion gateway
//!
//! Wire-level scenarios against mock backends:
//! - Request shaping per backend family
//! - Structured output and mandatory tool calls
//! - Retry and concurrency behavior
//! - Backend resolution from the environment
//! - Usage reporting

pub mod fixtures;
pub mod helpers;
pub mod mock_providers;

// Re-export commonly used items
pub use fixtures::*;
pub use helpers::*;
pub use mock_providers::*;

#[cfg(test)]
mod gateway_tests;
#[cfg(test)]
mod routing_tests;
#[cfg(test)]
mod usage_tests;

//! Concurrency gate.
//!
//! Bounds the number of logical requests in flight. Callers wait for a unit
//! rather than failing; the permit is released when dropped.

use gateway_core::GatewayError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, trace};

/// Default number of concurrent logical requests
pub const DEFAULT_MAX_CONCURRENT: usize = 10;

/// Counting gate over a semaphore
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `max_concurrent` holders (minimum 1)
    #[must_use]
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Wait for a unit
    ///
    /// # Errors
    /// Returns error only if the semaphore was closed
    pub async fn acquire(&self) -> Result<GatePermit, GatewayError> {
        if self.semaphore.available_permits() == 0 {
            debug!(
                max_concurrent = self.max_concurrent,
                "Concurrency gate full, waiting"
            );
        }

        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| GatewayError::internal("Concurrency gate semaphore closed"))?;

        trace!(in_flight = self.in_flight(), "Gate permit acquired");
        Ok(GatePermit { _permit: permit })
    }

    /// Configured limit
    #[must_use]
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Units currently free
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Units currently held
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.max_concurrent.saturating_sub(self.available())
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

/// A held unit of the gate
///
/// The unit is returned when dropped, including when the owning future is cancelled.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        trace!("Gate permit released");
    }
}

//! Metrics sink abstraction.
//!
//! The gateway reports latency and token usage through a [`MetricsSink`]
//! injected at construction. Implementations must tolerate concurrent calls
//! from every in-flight request.

use std::sync::Arc;
use std::time::Instant;

/// Receiver of per-call latency and token usage
pub trait MetricsSink: Send + Sync {
    /// Record one latency sample under `key`
    fn record_timing(&self, key: &str, start: Instant, end: Instant);

    /// Record token usage for one call
    fn record_tokens(&self, key: &str, model_id: &str, prompt_tokens: u32, completion_tokens: u32);
}

impl<T: MetricsSink + ?Sized> MetricsSink for Arc<T> {
    fn record_timing(&self, key: &str, start: Instant, end: Instant) {
        (**self).record_timing(key, start, end);
    }

    fn record_tokens(&self, key: &str, model_id: &str, prompt_tokens: u32, completion_tokens: u32) {
        (**self).record_tokens(key, model_id, prompt_tokens, completion_tokens);
    }
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record_timing(&self, _key: &str, _start: Instant, _end: Instant) {}

    fn record_tokens(&self, _key: &str, _model_id: &str, _prompt: u32, _completion: u32) {}
}

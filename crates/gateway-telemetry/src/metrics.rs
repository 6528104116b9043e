//! Prometheus metrics and sink composition.

use crate::error::TelemetryError;
use gateway_core::MetricsSink;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Instant;

/// Latency histogram buckets in seconds
const DURATION_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0];

/// [`MetricsSink`] exporting Prometheus metrics
///
/// - `lm_request_duration_seconds{key}` histogram
/// - `lm_prompt_tokens_total{key, model}` counter
/// - `lm_completion_tokens_total{key, model}` counter
#[derive(Clone)]
pub struct PrometheusSink {
    registry: Registry,
    request_duration: HistogramVec,
    prompt_tokens: IntCounterVec,
    completion_tokens: IntCounterVec,
}

impl PrometheusSink {
    /// Create a sink with its own registry
    ///
    /// # Errors
    /// Returns error if a metric cannot be created or registered
    pub fn new() -> Result<Self, TelemetryError> {
        Self::with_registry(Registry::new())
    }

    /// Create a sink registering into `registry`
    ///
    /// # Errors
    /// Returns error if a metric cannot be created or registered
    pub fn with_registry(registry: Registry) -> Result<Self, TelemetryError> {
        let request_duration = HistogramVec::new(
            HistogramOpts::new("lm_request_duration_seconds", "Backend call duration")
                .buckets(DURATION_BUCKETS.to_vec()),
            &["key"],
        )?;
        let prompt_tokens = IntCounterVec::new(
            Opts::new("lm_prompt_tokens_total", "Prompt tokens consumed"),
            &["key", "model"],
        )?;
        let completion_tokens = IntCounterVec::new(
            Opts::new("lm_completion_tokens_total", "Completion tokens produced"),
            &["key", "model"],
        )?;

        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(prompt_tokens.clone()))?;
        registry.register(Box::new(completion_tokens.clone()))?;

        Ok(Self {
            registry,
            request_duration,
            prompt_tokens,
            completion_tokens,
        })
    }

    /// The registry metrics are registered in
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    ///
    /// # Errors
    /// Returns error if encoding fails
    pub fn export(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}

impl MetricsSink for PrometheusSink {
    fn record_timing(&self, key: &str, start: Instant, end: Instant) {
        self.request_duration
            .with_label_values(&[key])
            .observe(end.saturating_duration_since(start).as_secs_f64());
    }

    fn record_tokens(&self, key: &str, model_id: &str, prompt_tokens: u32, completion_tokens: u32) {
        self.prompt_tokens
            .with_label_values(&[key, model_id])
            .inc_by(u64::from(prompt_tokens));
        self.completion_tokens
            .with_label_values(&[key, model_id])
            .inc_by(u64::from(completion_tokens));
    }
}

/// Forwards every record to each inner sink, in order
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanoutSink {
    /// Create an empty fanout
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of inner sinks
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether there are no inner sinks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl MetricsSink for FanoutSink {
    fn record_timing(&self, key: &str, start: Instant, end: Instant) {
        for sink in &self.sinks {
            sink.record_timing(key, start, end);
        }
    }

    fn record_tokens(&self, key: &str, model_id: &str, prompt_tokens: u32, completion_tokens: u32) {
        for sink in &self.sinks {
            sink.record_tokens(key, model_id, prompt_tokens, completion_tokens);
        }
    }
}

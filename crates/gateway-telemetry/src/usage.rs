//! In-memory usage and latency monitor.
//!
//! Records one [`UsageRecord`] per successful backend round trip and keeps
//! running aggregates:
//! - token totals per `(metric key, model id)`
//! - latency statistics per timing key

use chrono::{DateTime, Utc};
use gateway_core::MetricsSink;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One backend call's token usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Caller-supplied metric key
    pub metric_key: String,
    /// `<family>:<model>`
    pub model_id: String,
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// When the record was taken
    pub recorded_at: DateTime<Utc>,
}

/// Token totals for one `(metric key, model id)` pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    /// Metric key
    pub metric_key: String,
    /// Model id
    pub model_id: String,
    /// Number of recorded calls
    pub calls: u64,
    /// Total prompt tokens
    pub prompt_tokens: u64,
    /// Total completion tokens
    pub completion_tokens: u64,
}

impl TokenTotals {
    /// Prompt plus completion tokens
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Latency statistics for one timing key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Number of samples
    pub count: u64,
    /// Sum of all samples
    pub total: Duration,
    /// Fastest sample
    pub min: Duration,
    /// Slowest sample
    pub max: Duration,
}

impl LatencyStats {
    fn add(&mut self, sample: Duration) {
        if self.count == 0 {
            self.min = sample;
            self.max = sample;
        } else {
            self.min = self.min.min(sample);
            self.max = self.max.max(sample);
        }
        self.count += 1;
        self.total += sample;
    }

    /// Mean sample, zero when empty
    #[must_use]
    pub fn mean(&self) -> Duration {
        u32::try_from(self.count)
            .ok()
            .filter(|count| *count > 0)
            .map_or(Duration::ZERO, |count| self.total / count)
    }
}

/// Point-in-time copy of the monitor's state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Retained usage records, oldest first
    pub records: Vec<UsageRecord>,
    /// Records evicted because of the capacity limit
    pub evicted_records: u64,
    /// Token totals, sorted by key then model
    pub token_totals: Vec<TokenTotals>,
    /// Latency statistics by timing key
    pub latency: BTreeMap<String, LatencyStats>,
}

impl UsageSnapshot {
    /// Sum of prompt and completion tokens across all totals
    #[must_use]
    pub fn total_tokens(&self) -> u64 {
        self.token_totals.iter().map(TokenTotals::total_tokens).sum()
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    records: VecDeque<UsageRecord>,
    evicted: u64,
    tokens: HashMap<(String, String), TokenTotals>,
    latency: HashMap<String, LatencyStats>,
}

/// Thread-safe in-memory [`MetricsSink`]
#[derive(Debug, Default)]
pub struct UsageMonitor {
    capacity: Option<usize>,
    state: Mutex<MonitorState>,
}

impl UsageMonitor {
    /// Create a monitor with an unbounded record log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a monitor that keeps at most `capacity` records
    ///
    /// Aggregates are unaffected by eviction.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            state: Mutex::new(MonitorState::default()),
        }
    }

    /// Retained usage records, oldest first
    #[must_use]
    pub fn records(&self) -> Vec<UsageRecord> {
        self.state.lock().records.iter().cloned().collect()
    }

    /// Token totals for a key and model id
    #[must_use]
    pub fn token_totals(&self, metric_key: &str, model_id: &str) -> Option<TokenTotals> {
        self.state
            .lock()
            .tokens
            .get(&(metric_key.to_string(), model_id.to_string()))
            .cloned()
    }

    /// Latency statistics for a timing key
    #[must_use]
    pub fn latency(&self, key: &str) -> Option<LatencyStats> {
        self.state.lock().latency.get(key).copied()
    }

    /// Copy the current state
    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        let state = self.state.lock();

        let mut token_totals: Vec<TokenTotals> = state.tokens.values().cloned().collect();
        token_totals.sort_by(|a, b| {
            (a.metric_key.as_str(), a.model_id.as_str())
                .cmp(&(b.metric_key.as_str(), b.model_id.as_str()))
        });

        UsageSnapshot {
            records: state.records.iter().cloned().collect(),
            evicted_records: state.evicted,
            token_totals,
            latency: state
                .latency
                .iter()
                .map(|(key, stats)| (key.clone(), *stats))
                .collect(),
        }
    }

    /// Emit the current aggregates at `info` level
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        for totals in &snapshot.token_totals {
            info!(
                key = %totals.metric_key,
                model = %totals.model_id,
                calls = totals.calls,
                prompt_tokens = totals.prompt_tokens,
                completion_tokens = totals.completion_tokens,
                "Token usage"
            );
        }
        for (key, stats) in &snapshot.latency {
            info!(
                key = %key,
                count = stats.count,
                mean_ms = stats.mean().as_millis(),
                min_ms = stats.min.as_millis(),
                max_ms = stats.max.as_millis(),
                "Latency"
            );
        }
    }

    /// Clear all records and aggregates
    pub fn reset(&self) {
        *self.state.lock() = MonitorState::default();
    }
}

impl MetricsSink for UsageMonitor {
    fn record_timing(&self, key: &str, start: Instant, end: Instant) {
        let elapsed = end.saturating_duration_since(start);
        self.state
            .lock()
            .latency
            .entry(key.to_string())
            .or_default()
            .add(elapsed);
    }

    fn record_tokens(&self, key: &str, model_id: &str, prompt_tokens: u32, completion_tokens: u32) {
        let record = UsageRecord {
            metric_key: key.to_string(),
            model_id: model_id.to_string(),
            prompt_tokens,
            completion_tokens,
            recorded_at: Utc::now(),
        };

        let mut state = self.state.lock();

        let totals = state
            .tokens
            .entry((key.to_string(), model_id.to_string()))
            .or_insert_with(|| TokenTotals {
                metric_key: key.to_string(),
                model_id: model_id.to_string(),
                ..TokenTotals::default()
            });
        totals.calls += 1;
        totals.prompt_tokens += u64::from(prompt_tokens);
        totals.completion_tokens += u64::from(completion_tokens);

        state.records.push_back(record);
        if let Some(capacity) = self.capacity {
            while state.records.len() > capacity {
                state.records.pop_front();
                state.evicted += 1;
            }
        }

        debug!(
            key = %key,
            model = %model_id,
            prompt_tokens = prompt_tokens,
            completion_tokens = completion_tokens,
            "Recorded token usage"
        );
    }
}

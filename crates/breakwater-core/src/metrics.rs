//! Metrics recording facade.
//!
//! The engine reports outcomes through [`MetricsRecorder`] without depending
//! on any particular metrics backend. Recording is fire-and-forget: an
//! implementation must be cheap, must not block, and must never fail the
//! call path.

use std::time::Duration;

/// A snapshot of one guarded execution, reported once the final outcome is
/// known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetrics {
    /// Policy name the execution ran under.
    pub policy: String,
    /// Whether the final outcome was a success.
    pub success: bool,
    /// Attempts made, including the first call.
    pub attempts: u32,
    /// Wall-clock time from pipeline entry to final outcome.
    pub latency: Duration,
    /// Stable error code of the final failure, absent on success.
    pub code: Option<&'static str>,
}

/// Sink for engine metrics.
pub trait MetricsRecorder: Send + Sync {
    /// Records the outcome of one guarded execution.
    fn record_execution(&self, metrics: &ExecutionMetrics);

    /// Records a circuit breaker settling in `state` for `service`.
    fn record_circuit_state(&self, service: &str, state: &str);

    /// Records that attempt number `attempt` is about to run for `service`.
    fn record_retry_attempt(&self, service: &str, attempt: u32);

    /// Records a rate limiter decision; `limited` is true when the call was
    /// rejected.
    fn record_rate_limit(&self, service: &str, limited: bool);

    /// Records the bulkhead queue depth observed for `service`.
    fn record_bulkhead_queue(&self, service: &str, queued: usize);
}

/// A recorder that discards everything.
///
/// Used as the default when no backend is wired in, and in tests that do not
/// care about metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record_execution(&self, _metrics: &ExecutionMetrics) {}
    fn record_circuit_state(&self, _service: &str, _state: &str) {}
    fn record_retry_attempt(&self, _service: &str, _attempt: u32) {}
    fn record_rate_limit(&self, _service: &str, _limited: bool) {}
    fn record_bulkhead_queue(&self, _service: &str, _queued: usize) {}
}

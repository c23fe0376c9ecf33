//! Bridge from [`MetricsRecorder`] to the `metrics` crate macros.
//!
//! Enabled with the `metrics` feature. The process still has to install a
//! recorder (a Prometheus exporter, for example) for the emitted values to
//! go anywhere.

use breakwater_core::metrics::{ExecutionMetrics, MetricsRecorder};
use metrics::{counter, gauge, histogram};

/// Publishes engine metrics through the `metrics` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsFacade;

impl MetricsRecorder for MetricsFacade {
    fn record_execution(&self, metrics: &ExecutionMetrics) {
        let outcome = if metrics.success { "success" } else { "failure" };
        counter!(
            "breakwater_executions_total",
            "policy" => metrics.policy.clone(),
            "outcome" => outcome,
        )
        .increment(1);
        histogram!(
            "breakwater_execution_duration_seconds",
            "policy" => metrics.policy.clone(),
        )
        .record(metrics.latency.as_secs_f64());
        histogram!(
            "breakwater_execution_attempts",
            "policy" => metrics.policy.clone(),
        )
        .record(f64::from(metrics.attempts));
        if let Some(code) = metrics.code {
            counter!(
                "breakwater_failures_total",
                "policy" => metrics.policy.clone(),
                "code" => code,
            )
            .increment(1);
        }
    }

    fn record_circuit_state(&self, service: &str, state: &str) {
        // Encoded as a gauge so dashboards can graph transitions:
        // 0 closed, 1 open, 2 half-open.
        let value = match state {
            "CLOSED" => 0.0,
            "OPEN" => 1.0,
            _ => 2.0,
        };
        gauge!(
            "breakwater_circuit_state",
            "service" => service.to_string(),
        )
        .set(value);
    }

    fn record_retry_attempt(&self, service: &str, _attempt: u32) {
        counter!(
            "breakwater_retries_total",
            "service" => service.to_string(),
        )
        .increment(1);
    }

    fn record_rate_limit(&self, service: &str, limited: bool) {
        let decision = if limited { "limited" } else { "admitted" };
        counter!(
            "breakwater_rate_limit_decisions_total",
            "service" => service.to_string(),
            "decision" => decision,
        )
        .increment(1);
    }

    fn record_bulkhead_queue(&self, service: &str, queued: usize) {
        gauge!(
            "breakwater_bulkhead_queued",
            "service" => service.to_string(),
        )
        .set(queued as f64);
    }
}

//! Core infrastructure for breakwater.
//!
//! This crate provides the pieces shared by every breakwater crate:
//! - [`ExecuteError`]: the unified error type returned by guarded executions
//! - Event system for observability ([`events`])
//! - Metrics recording facade ([`metrics`])

pub mod error;
pub mod events;
pub mod metrics;

pub use error::ExecuteError;
pub use events::{EventListener, EventListeners, FnListener, ResilienceEvent};
pub use metrics::{ExecutionMetrics, MetricsRecorder, NoopMetrics};

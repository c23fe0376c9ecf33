//! Persisted circuit breaker state.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::codec::time_ms;

/// Position of a circuit breaker in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls flow through; failures are counted.
    Closed,
    /// Calls are rejected until the cool-down elapses.
    Open,
    /// A bounded number of probe calls test whether the dependency
    /// recovered.
    HalfOpen,
}

impl CircuitState {
    /// Wire and metrics label for the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "CLOSED",
            CircuitState::Open => "OPEN",
            CircuitState::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-service breaker record persisted in the shared store.
///
/// `version` implements optimistic concurrency: a save carries the version
/// the writer read, and the store rejects it if another writer advanced the
/// record in the meantime. The store assigns the stored version; writers
/// never pick one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    /// Service this record tracks.
    pub service_name: String,
    pub state: CircuitState,
    /// Consecutive failures observed while Closed.
    pub failure_count: u32,
    /// Successes observed while Half-Open.
    pub success_count: u32,
    /// When the most recent failure was recorded, if any.
    #[serde(
        rename = "last_failure_time_ms",
        default,
        with = "time_ms::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_failure_time: Option<SystemTime>,
    /// When the breaker last changed state.
    #[serde(rename = "last_state_change_ms", with = "time_ms")]
    pub last_state_change: SystemTime,
    /// Store-assigned record version.
    pub version: u64,
}

impl CircuitBreakerState {
    /// A fresh Closed record for `service_name`, not yet persisted
    /// (`version` 0).
    pub fn new(service_name: impl Into<String>, now: SystemTime) -> Self {
        Self {
            service_name: service_name.into(),
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
            last_state_change: now,
            version: 0,
        }
    }
}

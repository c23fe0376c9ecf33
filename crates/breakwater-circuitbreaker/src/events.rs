use std::time::Instant;

use breakwater_core::events::ResilienceEvent;
use breakwater_policy::state::CircuitState;

/// Events emitted by the circuit breaker.
#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    /// The persisted record moved from one state to another.
    StateTransition {
        service: String,
        from: CircuitState,
        to: CircuitState,
        at: Instant,
    },
    /// An admission check rejected a call without running it.
    CallRejected { service: String, at: Instant },
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { at, .. }
            | CircuitBreakerEvent::CallRejected { at, .. } => *at,
        }
    }

    fn service(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { service, .. }
            | CircuitBreakerEvent::CallRejected { service, .. } => service,
        }
    }
}

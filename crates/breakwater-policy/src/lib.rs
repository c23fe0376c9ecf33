//! Resilience policy model, validation, and wire codec.
//!
//! A [`ResiliencePolicy`] is an immutable, versioned description of how one
//! logical service should be guarded: up to five optional sub-configurations
//! (circuit breaker, retry, timeout, rate limit, bulkhead). Policies are
//! validated with [`validate`] before they are persisted, and move to and
//! from the store's wire format through the [`codec`] module.

pub mod codec;
pub mod model;
pub mod state;
pub mod validate;

pub use codec::{decode_policy, decode_state, encode_policy, encode_state, CodecError};
pub use model::{
    BulkheadConfig, CircuitBreakerConfig, RateLimitAlgorithm, RateLimitConfig, ResiliencePolicy,
    RetryConfig, TimeoutConfig,
};
pub use state::{CircuitBreakerState, CircuitState};
pub use validate::{validate, FieldError, ValidationError};

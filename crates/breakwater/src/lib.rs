//! Centralized resilience policies for distributed services.
//!
//! `breakwater` stores per-service resilience configuration in a shared
//! store and executes calls under it. A policy names any subset of five
//! patterns, applied in a fixed order around every call:
//!
//! - **Circuit breaker**: trips after consecutive failures, cools down,
//!   then probes before closing again. State is persisted, so every
//!   engine instance sharing the store sees the same breaker.
//! - **Bulkhead**: caps in-flight calls per service, with a bounded FIFO
//!   queue for the overflow.
//! - **Rate limiter**: token bucket or sliding window admission.
//! - **Timeout**: a per-call time budget with a policy-level cap.
//! - **Retry**: exponential backoff with jitter around all of the above.
//!
//! Policies are data, not code: operators change thresholds at runtime and
//! the next execution picks them up through a TTL cache.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use breakwater::engine::{PolicyAdmin, ResilienceExecutor};
//! use breakwater::policy::model::{CircuitBreakerConfig, ResiliencePolicy, RetryConfig};
//! use breakwater::store::memory::InMemoryStore;
//! use breakwater::store::remote::RemoteStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
//! let executor = ResilienceExecutor::new(Arc::clone(&store));
//!
//! let admin = PolicyAdmin::new(Arc::clone(executor.repository()));
//! admin
//!     .create(
//!         &ResiliencePolicy::new("payments")
//!             .with_circuit_breaker(CircuitBreakerConfig::default())
//!             .with_retry(RetryConfig::default()),
//!     )
//!     .await
//!     .unwrap();
//!
//! let charged: Result<u64, _> = executor
//!     .execute::<_, std::io::Error, _, _>("payments", || async { Ok(4200) })
//!     .await;
//! assert_eq!(charged.unwrap(), 4200);
//! # }
//! ```
//!
//! # Individual crates
//!
//! Each piece is also available as a standalone crate:
//!
//! - `breakwater-core` (errors, events, metrics facade)
//! - `breakwater-policy` (policy model, wire codec, validation)
//! - `breakwater-ratelimiter`
//! - `breakwater-retry`
//! - `breakwater-bulkhead`
//! - `breakwater-store` (store trait, in-memory store, cached repository)
//! - `breakwater-circuitbreaker`
//! - `breakwater-engine` (executor, admin, health, tower layer)

pub use breakwater_core as core;

pub use breakwater_policy as policy;

pub use breakwater_ratelimiter as ratelimiter;

pub use breakwater_retry as retry;

pub use breakwater_bulkhead as bulkhead;

pub use breakwater_store as store;

pub use breakwater_circuitbreaker as circuitbreaker;

pub use breakwater_engine as engine;

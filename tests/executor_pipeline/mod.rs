//! End-to-end tests for the resilience execution pipeline.
//!
//! Test organization:
//! - pass_through.rs: missing and inert policies, store outages
//! - ordering.rs: gate precedence and per-attempt re-admission
//! - retry_flow.rs: backoff-driven retry around the full pipeline
//! - recovery.rs: the trip, cool-down, probe, close cycle
//! - concurrency.rs: bulkhead limits under parallel load
//! - tower_layer.rs: the middleware surface

mod recovery;
mod tower_layer;

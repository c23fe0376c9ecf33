//! Property-based tests for breakwater.
//!
//! Run with: cargo test --test property_tests
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold across the policy layer and the admission primitives.

pub mod cache;
pub mod circuit_breaker;
pub mod validation;

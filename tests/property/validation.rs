//! Property tests for policy validation.
//!
//! Invariants tested:
//! - Configurations built inside the documented ranges always pass
//! - Out-of-range fields are reported under their wire names
//! - Cross-field rules hold regardless of the other fields

use std::time::Duration;

use proptest::prelude::*;

use breakwater_policy::model::{
    BulkheadConfig, CircuitBreakerConfig, RateLimitAlgorithm, RateLimitConfig, ResiliencePolicy,
    RetryConfig, TimeoutConfig,
};
use breakwater_policy::validate::{validate, ValidationError};

fn circuit_breaker_in_range() -> impl Strategy<Value = CircuitBreakerConfig> {
    (1u32..=100, 1u32..=10, 1u64..=300, 1u32..=10).prop_map(
        |(failure, success, timeout_s, probes)| CircuitBreakerConfig {
            failure_threshold: failure,
            success_threshold: success.min(failure),
            timeout: Duration::from_secs(timeout_s),
            probe_count: probes,
        },
    )
}

fn retry_in_range() -> impl Strategy<Value = RetryConfig> {
    (1u32..=10, 1u64..=10_000, 1u64..=300, 10u32..=100, 0u32..=100).prop_map(
        |(attempts, base_ms, max_s, multiplier_tenths, jitter_hundredths)| {
            let max_delay = Duration::from_secs(max_s);
            RetryConfig {
                max_attempts: attempts,
                base_delay: Duration::from_millis(base_ms).min(max_delay),
                max_delay,
                multiplier: f64::from(multiplier_tenths) / 10.0,
                jitter_percent: f64::from(jitter_hundredths) / 100.0,
            }
        },
    )
}

fn timeout_in_range() -> impl Strategy<Value = TimeoutConfig> {
    (100u64..=300_000, proptest::option::of(300u64..=600)).prop_map(|(default_ms, max_s)| {
        TimeoutConfig {
            default: Duration::from_millis(default_ms),
            max: max_s.map(Duration::from_secs),
        }
    })
}

fn rate_limit_in_range() -> impl Strategy<Value = RateLimitConfig> {
    (
        prop_oneof![
            Just(RateLimitAlgorithm::TokenBucket),
            Just(RateLimitAlgorithm::SlidingWindow)
        ],
        1u32..=100_000,
        1u64..=3600,
        0u32..=10_000,
    )
        .prop_map(|(algorithm, limit, window_s, burst)| RateLimitConfig {
            algorithm,
            limit,
            window: Duration::from_secs(window_s),
            burst_size: burst.min(limit),
        })
}

fn bulkhead_in_range() -> impl Strategy<Value = BulkheadConfig> {
    (1u32..=10_000, 0u32..=10_000, 1u64..=30_000).prop_map(
        |(concurrent, queue, timeout_ms)| BulkheadConfig {
            max_concurrent: concurrent,
            max_queue: queue,
            queue_timeout: Duration::from_millis(timeout_ms),
        },
    )
}

fn policy_in_range() -> impl Strategy<Value = ResiliencePolicy> {
    (
        "[a-z][a-z0-9-]{0,30}",
        proptest::option::of(circuit_breaker_in_range()),
        proptest::option::of(retry_in_range()),
        proptest::option::of(timeout_in_range()),
        proptest::option::of(rate_limit_in_range()),
        proptest::option::of(bulkhead_in_range()),
    )
        .prop_map(|(name, cb, retry, timeout, rate, bulkhead)| {
            let mut policy = ResiliencePolicy::new(name);
            policy.circuit_breaker = cb;
            policy.retry = retry;
            policy.timeout = timeout;
            policy.rate_limit = rate;
            policy.bulkhead = bulkhead;
            policy
        })
}

fn fields(err: &ValidationError) -> Vec<&'static str> {
    err.errors().iter().map(|e| e.field).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: any policy assembled inside the documented ranges passes.
    #[test]
    fn in_range_policies_are_admissible(policy in policy_in_range()) {
        let verdict = validate(&policy);
        prop_assert!(verdict.is_ok(), "rejected {policy:?}: {verdict:?}");
    }

    /// Property: attempt counts outside 1..=10 are rejected under the
    /// retry.max_attempts field.
    #[test]
    fn out_of_range_attempts_are_rejected(
        attempts in prop_oneof![Just(0u32), 11u32..=1000],
        retry in retry_in_range(),
    ) {
        let policy = ResiliencePolicy::new("svc").with_retry(RetryConfig {
            max_attempts: attempts,
            ..retry
        });
        let err = validate(&policy).unwrap_err();
        prop_assert!(fields(&err).contains(&"retry.max_attempts"));
    }

    /// Property: burst headroom above the base limit is always rejected,
    /// whatever else the config says.
    #[test]
    fn burst_above_limit_is_rejected(
        rate in rate_limit_in_range(),
        excess in 1u32..=1000,
    ) {
        let policy = ResiliencePolicy::new("svc").with_rate_limit(RateLimitConfig {
            burst_size: rate.limit.saturating_add(excess).min(10_000),
            ..rate
        });
        // Saturation may keep burst within limit for huge limits; only the
        // genuinely violating combinations must fail.
        let violating = policy.rate_limit.as_ref().is_some_and(|r| r.burst_size > r.limit);
        if violating {
            let err = validate(&policy).unwrap_err();
            prop_assert!(fields(&err).contains(&"rate_limit.burst_size"));
        }
    }

    /// Property: a success threshold above the failure threshold fails the
    /// cross-field rule even when both are individually in range.
    #[test]
    fn success_threshold_cannot_exceed_failure_threshold(
        failure in 1u32..=9,
        excess in 1u32..=5,
        cb in circuit_breaker_in_range(),
    ) {
        let policy = ResiliencePolicy::new("svc").with_circuit_breaker(CircuitBreakerConfig {
            failure_threshold: failure,
            success_threshold: (failure + excess).min(10),
            ..cb
        });
        if policy.circuit_breaker.as_ref().is_some_and(|c| c.success_threshold > c.failure_threshold) {
            let err = validate(&policy).unwrap_err();
            prop_assert!(fields(&err).contains(&"circuit_breaker.success_threshold"));
        }
    }

    /// Property: whitespace-only names never pass.
    #[test]
    fn blank_names_are_rejected(name in "[ \t]{0,8}") {
        let err = validate(&ResiliencePolicy::new(name)).unwrap_err();
        prop_assert!(fields(&err).contains(&"name"));
    }
}

//! Property tests for the circuit breaker.
//!
//! Invariants tested:
//! - The breaker opens after exactly failure_threshold consecutive failures
//! - While open, admissions are rejected with a bounded retry hint
//! - Half-open closes after exactly success_threshold successful probes
//! - Reset always restores a fresh Closed record

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use tokio::runtime::Runtime;

use breakwater_circuitbreaker::{Admission, CircuitBreaker};
use breakwater_policy::model::CircuitBreakerConfig;
use breakwater_policy::state::CircuitState;
use breakwater_store::memory::InMemoryStore;
use breakwater_store::remote::RemoteStore;

fn harness() -> (CircuitBreaker, Arc<dyn RemoteStore>) {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
    (CircuitBreaker::new(Arc::clone(&store)), store)
}

fn config(failure_threshold: u32, success_threshold: u32) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        success_threshold,
        timeout: Duration::from_secs(60),
        probe_count: 1,
    }
}

async fn state_of(breaker: &CircuitBreaker, service: &str) -> CircuitState {
    breaker
        .current_state(service)
        .await
        .unwrap()
        .expect("record should exist")
        .state
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: failure_threshold - 1 failures leave the breaker Closed;
    /// the next failure opens it.
    #[test]
    fn opens_after_exactly_threshold_failures(threshold in 1u32..=10) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let (breaker, _store) = harness();
            let cfg = config(threshold, 1);

            prop_assert!(matches!(
                breaker.admit("svc", &cfg).await.unwrap(),
                Admission::Admitted
            ));

            for _ in 0..threshold - 1 {
                breaker.record_failure("svc", &cfg).await.unwrap();
            }
            prop_assert_eq!(state_of(&breaker, "svc").await, CircuitState::Closed);

            breaker.record_failure("svc", &cfg).await.unwrap();
            prop_assert_eq!(state_of(&breaker, "svc").await, CircuitState::Open);

            Ok(())
        })?;
    }

    /// Property: while the cool-down runs, every admission is rejected and
    /// the retry hint never exceeds the configured cool-down.
    #[test]
    fn open_breaker_rejects_with_bounded_hint(threshold in 1u32..=5, calls in 1usize..=10) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let (breaker, _store) = harness();
            let cfg = config(threshold, 1);

            breaker.admit("svc", &cfg).await.unwrap();
            for _ in 0..threshold {
                breaker.record_failure("svc", &cfg).await.unwrap();
            }

            for _ in 0..calls {
                match breaker.admit("svc", &cfg).await.unwrap() {
                    Admission::Rejected { retry_after } => {
                        let hint = retry_after.expect("cool-down still running");
                        prop_assert!(hint <= cfg.timeout);
                    }
                    other => prop_assert!(false, "expected rejection, got {:?}", other),
                }
            }

            Ok(())
        })?;
    }

    /// Property: a half-open breaker closes after exactly success_threshold
    /// successful probes, not before.
    #[test]
    fn closes_after_exactly_threshold_probe_successes(successes in 1u32..=5) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let (breaker, _store) = harness();
            let cfg = CircuitBreakerConfig {
                failure_threshold: successes.max(1),
                success_threshold: successes,
                timeout: Duration::from_millis(10),
                probe_count: 1,
            };

            breaker.admit("svc", &cfg).await.unwrap();
            for _ in 0..cfg.failure_threshold {
                breaker.record_failure("svc", &cfg).await.unwrap();
            }
            prop_assert_eq!(state_of(&breaker, "svc").await, CircuitState::Open);

            tokio::time::sleep(Duration::from_millis(30)).await;

            for n in 1..=successes {
                let admission = breaker.admit("svc", &cfg).await.unwrap();
                prop_assert!(
                    matches!(admission, Admission::Probe(_)),
                    "probe {} refused: {:?}",
                    n,
                    admission
                );
                breaker.record_success("svc", &cfg).await.unwrap();
                let expected = if n < successes {
                    CircuitState::HalfOpen
                } else {
                    CircuitState::Closed
                };
                prop_assert_eq!(state_of(&breaker, "svc").await, expected);
            }

            Ok(())
        })?;
    }

    /// Property: reset produces a fresh Closed record on the next
    /// admission, whatever state the breaker was in.
    #[test]
    fn reset_restores_a_fresh_record(failures in 0u32..=6) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let (breaker, _store) = harness();
            let cfg = config(3, 1);

            breaker.admit("svc", &cfg).await.unwrap();
            for _ in 0..failures {
                breaker.record_failure("svc", &cfg).await.unwrap();
            }

            breaker.reset("svc").await.unwrap();
            prop_assert!(breaker.current_state("svc").await.unwrap().is_none());

            prop_assert!(matches!(
                breaker.admit("svc", &cfg).await.unwrap(),
                Admission::Admitted
            ));
            let record = breaker.current_state("svc").await.unwrap().unwrap();
            prop_assert_eq!(record.state, CircuitState::Closed);
            prop_assert_eq!(record.failure_count, 0);
            prop_assert_eq!(record.version, 1);

            Ok(())
        })?;
    }
}

//! The full breaker cycle through the executor: trip on consecutive
//! failures, reject during cool-down, probe after it, close on enough
//! probe successes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use breakwater_circuitbreaker::CircuitBreakerEvent;
use breakwater_core::error::ExecuteError;
use breakwater_engine::ResilienceExecutor;
use breakwater_policy::model::{CircuitBreakerConfig, ResiliencePolicy};
use breakwater_policy::state::CircuitState;
use breakwater_store::memory::InMemoryStore;
use breakwater_store::remote::RemoteStore;

fn breaker_policy(service: &str) -> ResiliencePolicy {
    ResiliencePolicy::new(service).with_circuit_breaker(CircuitBreakerConfig {
        failure_threshold: 3,
        success_threshold: 2,
        timeout: Duration::from_millis(100),
        probe_count: 1,
    })
}

async fn run(
    executor: &ResilienceExecutor,
    service: &str,
    healthy: &Arc<AtomicBool>,
) -> Result<&'static str, ExecuteError<&'static str>> {
    let healthy = Arc::clone(healthy);
    executor
        .execute(service, move || {
            let healthy = Arc::clone(&healthy);
            async move {
                if healthy.load(Ordering::SeqCst) {
                    Ok("ok")
                } else {
                    Err("dependency down")
                }
            }
        })
        .await
}

#[tokio::test]
async fn breaker_trips_cools_down_probes_and_closes() {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
    let executor = ResilienceExecutor::new(store);
    executor
        .repository()
        .save(&breaker_policy("payments"))
        .await
        .unwrap();

    let healthy = Arc::new(AtomicBool::new(false));

    // Three consecutive failures trip the breaker.
    for _ in 0..3 {
        let result = run(&executor, "payments", &healthy).await;
        assert!(matches!(result, Err(ExecuteError::Application(_))));
    }
    assert_eq!(
        executor.circuit_state("payments").await.unwrap().unwrap().state,
        CircuitState::Open
    );

    // During the cool-down every call is rejected without running.
    let rejected = run(&executor, "payments", &healthy).await;
    match rejected {
        Err(ExecuteError::CircuitOpen { retry_after, .. }) => {
            assert!(retry_after.unwrap() <= Duration::from_millis(100));
        }
        other => panic!("expected a circuit rejection, got {other:?}"),
    }

    // Cool-down passes and the dependency recovers.
    tokio::time::sleep(Duration::from_millis(150)).await;
    healthy.store(true, Ordering::SeqCst);

    // First probe succeeds; one more success is needed to close.
    assert!(run(&executor, "payments", &healthy).await.is_ok());
    assert_eq!(
        executor.circuit_state("payments").await.unwrap().unwrap().state,
        CircuitState::HalfOpen
    );

    assert!(run(&executor, "payments", &healthy).await.is_ok());
    assert_eq!(
        executor.circuit_state("payments").await.unwrap().unwrap().state,
        CircuitState::Closed
    );

    // Traffic flows normally again.
    assert!(run(&executor, "payments", &healthy).await.is_ok());
}

#[tokio::test]
async fn a_failed_probe_reopens_the_breaker() {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
    let executor = ResilienceExecutor::new(store);
    executor
        .repository()
        .save(&breaker_policy("inventory"))
        .await
        .unwrap();

    let healthy = Arc::new(AtomicBool::new(false));
    for _ in 0..3 {
        let _ = run(&executor, "inventory", &healthy).await;
    }

    tokio::time::sleep(Duration::from_millis(150)).await;

    // Still unhealthy: the probe runs, fails, and reopens immediately.
    let probe = run(&executor, "inventory", &healthy).await;
    assert!(matches!(probe, Err(ExecuteError::Application(_))));
    assert_eq!(
        executor.circuit_state("inventory").await.unwrap().unwrap().state,
        CircuitState::Open
    );

    // And the fresh cool-down rejects again.
    let rejected = run(&executor, "inventory", &healthy).await;
    assert!(matches!(rejected, Err(ExecuteError::CircuitOpen { .. })));
}

#[tokio::test]
async fn transitions_are_observable_through_the_builder_hook() {
    let transitions: Arc<Mutex<Vec<(CircuitState, CircuitState)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&transitions);

    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
    let executor = ResilienceExecutor::builder(store)
        .on_circuit_event(move |event| {
            if let CircuitBreakerEvent::StateTransition { from, to, .. } = event {
                sink.lock().unwrap().push((*from, *to));
            }
        })
        .build();
    executor
        .repository()
        .save(&breaker_policy("ledger"))
        .await
        .unwrap();

    let healthy = Arc::new(AtomicBool::new(false));
    for _ in 0..3 {
        let _ = run(&executor, "ledger", &healthy).await;
    }
    tokio::time::sleep(Duration::from_millis(150)).await;
    healthy.store(true, Ordering::SeqCst);
    let _ = run(&executor, "ledger", &healthy).await;
    let _ = run(&executor, "ledger", &healthy).await;

    assert_eq!(
        *transitions.lock().unwrap(),
        vec![
            (CircuitState::Closed, CircuitState::Open),
            (CircuitState::Open, CircuitState::HalfOpen),
            (CircuitState::HalfOpen, CircuitState::Closed),
        ]
    );
}

#[tokio::test]
async fn reset_reopens_traffic_immediately() {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
    let executor = ResilienceExecutor::new(store);
    executor
        .repository()
        .save(&breaker_policy("shipping"))
        .await
        .unwrap();

    let healthy = Arc::new(AtomicBool::new(false));
    for _ in 0..3 {
        let _ = run(&executor, "shipping", &healthy).await;
    }
    assert!(matches!(
        run(&executor, "shipping", &healthy).await,
        Err(ExecuteError::CircuitOpen { .. })
    ));

    assert!(executor.reset_circuit("shipping").await.unwrap());
    healthy.store(true, Ordering::SeqCst);

    assert!(run(&executor, "shipping", &healthy).await.is_ok());
    let record = executor.circuit_state("shipping").await.unwrap().unwrap();
    assert_eq!(record.state, CircuitState::Closed);
}

//! Policy enforcement through a tower service stack.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use breakwater_core::error::ExecuteError;
use breakwater_engine::{ResilienceExecutor, ResilienceLayer};
use breakwater_policy::model::{
    CircuitBreakerConfig, RateLimitAlgorithm, RateLimitConfig, ResiliencePolicy,
};
use breakwater_store::memory::InMemoryStore;
use breakwater_store::remote::RemoteStore;
use tower::{service_fn, Service, ServiceBuilder, ServiceExt};

fn executor() -> Arc<ResilienceExecutor> {
    let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
    Arc::new(ResilienceExecutor::new(store))
}

#[tokio::test]
async fn a_stack_without_a_policy_passes_requests_through() {
    let executor = executor();
    let mut stack = ServiceBuilder::new()
        .layer(ResilienceLayer::new(Arc::clone(&executor), "gateway"))
        .service(service_fn(|name: &'static str| async move {
            Ok::<_, &'static str>(format!("hello {name}"))
        }));

    let reply = stack.ready().await.unwrap().call("ada").await.unwrap();
    assert_eq!(reply, "hello ada");
}

#[tokio::test]
async fn rate_limit_rejections_surface_through_the_stack() {
    let executor = executor();
    executor
        .repository()
        .save(&ResiliencePolicy::new("gateway").with_rate_limit(RateLimitConfig {
            algorithm: RateLimitAlgorithm::SlidingWindow,
            limit: 1,
            window: Duration::from_secs(60),
            burst_size: 0,
        }))
        .await
        .unwrap();

    let mut stack = ServiceBuilder::new()
        .layer(ResilienceLayer::new(Arc::clone(&executor), "gateway"))
        .service(service_fn(|n: u32| async move { Ok::<_, &'static str>(n * 2) }));

    let first = stack.ready().await.unwrap().call(21).await;
    assert_eq!(first.unwrap(), 42);

    let second = stack.ready().await.unwrap().call(21).await;
    match second {
        Err(err @ ExecuteError::RateLimited { .. }) => {
            assert_eq!(err.code(), "RATE_LIMIT_EXCEEDED");
        }
        other => panic!("expected a rate limit rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn a_tripped_breaker_blocks_calls_before_the_inner_service() {
    let executor = executor();
    executor
        .repository()
        .save(
            &ResiliencePolicy::new("gateway").with_circuit_breaker(CircuitBreakerConfig {
                failure_threshold: 2,
                success_threshold: 1,
                timeout: Duration::from_secs(60),
                probe_count: 1,
            }),
        )
        .await
        .unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let mut stack = ServiceBuilder::new()
        .layer(ResilienceLayer::new(Arc::clone(&executor), "gateway"))
        .service(service_fn(move |_: &'static str| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<&'static str, &'static str>("backend down")
            }
        }));

    for _ in 0..2 {
        let outcome = stack.ready().await.unwrap().call("ping").await;
        assert!(matches!(outcome, Err(ExecuteError::Application(_))));
    }

    let rejected = stack.ready().await.unwrap().call("ping").await;
    match rejected {
        Err(err @ ExecuteError::CircuitOpen { .. }) => {
            assert_eq!(err.code(), "CIRCUIT_OPEN");
        }
        other => panic!("expected an open-circuit rejection, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

//! Tower middleware over the executor.
//!
//! [`ResilienceLayer`] wraps any [`tower::Service`] so each call runs under
//! a named policy. Requests are cloned per attempt because retry may invoke
//! the inner service several times.

use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tower::{Layer, Service};

use breakwater_core::error::ExecuteError;

use crate::executor::ResilienceExecutor;

/// Applies a named resilience policy to a wrapped service.
#[derive(Clone)]
pub struct ResilienceLayer {
    executor: Arc<ResilienceExecutor>,
    policy: String,
}

impl ResilienceLayer {
    pub fn new(executor: Arc<ResilienceExecutor>, policy: impl Into<String>) -> Self {
        Self {
            executor,
            policy: policy.into(),
        }
    }
}

impl<S> Layer<S> for ResilienceLayer {
    type Service = ResilienceService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResilienceService {
            inner,
            executor: Arc::clone(&self.executor),
            policy: self.policy.clone(),
        }
    }
}

/// A service whose calls run through the resilience pipeline.
#[derive(Clone)]
pub struct ResilienceService<S> {
    inner: S,
    executor: Arc<ResilienceExecutor>,
    policy: String,
}

impl<S, Req> Service<Req> for ResilienceService<S>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send,
    S::Response: Send,
    S::Error: Send,
    Req: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = ExecuteError<S::Error>;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(ExecuteError::Application)
    }

    fn call(&mut self, request: Req) -> Self::Future {
        let executor = Arc::clone(&self.executor);
        let policy = self.policy.clone();
        let inner = self.inner.clone();
        Box::pin(async move {
            executor
                .execute(&policy, move || {
                    let mut service = inner.clone();
                    let request = request.clone();
                    async move { service.call(request).await }
                })
                .await
        })
    }
}

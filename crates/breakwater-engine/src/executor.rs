//! The guarded execution pipeline.
//!
//! [`ResilienceExecutor`] runs caller-supplied async operations under the
//! policy stored for a service name. Each attempt passes the same fixed
//! sequence of gates:
//!
//! 1. circuit breaker admission
//! 2. bulkhead slot acquisition
//! 3. rate limiter admission
//! 4. the operation itself, under its time budget
//!
//! and retry wraps the whole sequence, so a long backoff never holds a
//! bulkhead slot or a rate limiter token. Admission rejections are final
//! for the attempt that saw them: only operation timeouts and application
//! errors the caller classifies as retryable feed the retry schedule.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use breakwater_bulkhead::{Bulkhead, BulkheadError};
use breakwater_circuitbreaker::{Admission, CircuitBreaker, CircuitBreakerEvent};
use breakwater_core::error::ExecuteError;
use breakwater_core::events::FnListener;
use breakwater_core::metrics::{ExecutionMetrics, MetricsRecorder, NoopMetrics};
use breakwater_policy::model::{
    BulkheadConfig, RateLimitConfig, ResiliencePolicy, TimeoutConfig,
};
use breakwater_policy::state::CircuitBreakerState;
use breakwater_ratelimiter::SharedRateLimiter;
use breakwater_retry::RetrySchedule;
use breakwater_store::cache::CacheStats;
use breakwater_store::error::StoreError;
use breakwater_store::remote::RemoteStore;
use breakwater_store::repository::{CachedPolicyRepository, RepositoryConfig};

/// Per-call knobs for a single execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Overrides the policy's default operation timeout. The policy's
    /// `max` cap still applies.
    pub timeout: Option<Duration>,
}

/// Outcome of one guarded execution together with its accounting.
#[derive(Debug)]
pub struct ExecutionReport<T, E> {
    pub outcome: Result<T, ExecuteError<E>>,
    /// Attempts made, counting the first call.
    pub attempts: u32,
    /// Wall-clock time across all attempts, including backoff sleeps.
    pub elapsed: Duration,
}

struct LimiterEntry {
    config: RateLimitConfig,
    limiter: SharedRateLimiter,
}

struct BulkheadEntry {
    config: BulkheadConfig,
    bulkhead: Bulkhead,
}

enum AttemptFailure<E> {
    /// Returned to the caller as-is.
    Fatal(ExecuteError<E>),
    /// Eligible for another attempt if the schedule allows one.
    Retryable(ExecuteError<E>),
}

/// Runs operations under stored resilience policies.
///
/// The executor resolves policies through a [`CachedPolicyRepository`], so
/// the hot path is a cache lookup; live limiter and bulkhead instances are
/// kept per service and rebuilt when their configuration changes. A service
/// with no stored policy, or a policy with every pattern unset, executes
/// as a plain pass-through.
pub struct ResilienceExecutor {
    repository: Arc<CachedPolicyRepository>,
    breaker: Arc<CircuitBreaker>,
    limiters: Mutex<HashMap<String, LimiterEntry>>,
    bulkheads: Mutex<HashMap<String, BulkheadEntry>>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ResilienceExecutor {
    /// An executor over `store` with default cache settings and no metrics.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        ExecutorBuilder::new(store).build()
    }

    /// Starts a builder for customized cache, metrics, and event wiring.
    pub fn builder(store: Arc<dyn RemoteStore>) -> ExecutorBuilder {
        ExecutorBuilder::new(store)
    }

    /// Runs `operation` under the policy stored for `policy`, treating
    /// every application error as retryable.
    pub async fn execute<T, E, F, Fut>(
        &self,
        policy: &str,
        operation: F,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_report(policy, ExecuteOptions::default(), |_: &E| true, operation)
            .await
            .outcome
    }

    /// Like [`execute`](Self::execute), but lets the caller decide which
    /// application errors are worth another attempt.
    pub async fn execute_classified<T, E, F, Fut, R>(
        &self,
        policy: &str,
        retryable: R,
        operation: F,
    ) -> Result<T, ExecuteError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        self.execute_with_report(policy, ExecuteOptions::default(), retryable, operation)
            .await
            .outcome
    }

    /// Full-control variant returning attempt count and latency alongside
    /// the outcome.
    pub async fn execute_with_report<T, E, F, Fut, R>(
        &self,
        policy: &str,
        options: ExecuteOptions,
        retryable: R,
        mut operation: F,
    ) -> ExecutionReport<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        let started = Instant::now();

        let resolved = match self.repository.get(policy).await {
            Ok(resolved) => resolved,
            Err(err) => {
                // Store outage past the staleness grace: run unguarded
                // rather than refuse service.
                tracing::warn!(policy, error = %err, "policy unavailable, executing unguarded");
                None
            }
        };

        let stored = match resolved {
            Some(p) if p.has_any_pattern() => p,
            _ => {
                let outcome = operation().await.map_err(ExecuteError::Application);
                let report = ExecutionReport {
                    outcome,
                    attempts: 1,
                    elapsed: started.elapsed(),
                };
                self.report(policy, &report);
                return report;
            }
        };

        let mut schedule = stored.retry.as_ref().map(|cfg| RetrySchedule::new(*cfg));
        let mut attempts = 0u32;

        let outcome = loop {
            attempts += 1;
            match self
                .attempt(policy, &stored, options, &retryable, &mut operation)
                .await
            {
                Ok(value) => break Ok(value),
                Err(AttemptFailure::Fatal(err)) => break Err(err),
                Err(AttemptFailure::Retryable(err)) => {
                    match schedule.as_mut().and_then(RetrySchedule::next_backoff) {
                        Some(delay) => {
                            self.metrics.record_retry_attempt(policy, attempts + 1);
                            tracing::debug!(
                                policy,
                                attempt = attempts + 1,
                                delay_ms = delay.as_millis() as u64,
                                "retrying after backoff"
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            // Tag as exhausted only when a retry actually
                            // happened; a single-attempt schedule returns
                            // the failure untouched.
                            if attempts > 1 {
                                break Err(ExecuteError::RetryExhausted {
                                    service: policy.to_string(),
                                    attempts,
                                    last: Box::new(err),
                                });
                            }
                            break Err(err);
                        }
                    }
                }
            }
        };

        let report = ExecutionReport {
            outcome,
            attempts,
            elapsed: started.elapsed(),
        };
        self.report(policy, &report);
        report
    }

    /// One pass through the admission gates and the operation.
    async fn attempt<T, E, F, Fut, R>(
        &self,
        policy: &str,
        cfg: &ResiliencePolicy,
        options: ExecuteOptions,
        retryable: &R,
        operation: &mut F,
    ) -> Result<T, AttemptFailure<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
    {
        // Held until the attempt resolves so the half-open probe quota
        // frees only once the outcome is recorded.
        let _probe = match &cfg.circuit_breaker {
            Some(cb) => match self.breaker.admit(policy, cb).await {
                Ok(Admission::Admitted) => None,
                Ok(Admission::Probe(guard)) => Some(guard),
                Ok(Admission::Rejected { retry_after }) => {
                    return Err(AttemptFailure::Fatal(ExecuteError::CircuitOpen {
                        service: policy.to_string(),
                        retry_after,
                    }));
                }
                Err(err) => {
                    // Breaker state unreadable: admit rather than fail the
                    // call on a bookkeeping outage.
                    tracing::warn!(policy, error = %err, "breaker state unavailable, admitting unguarded");
                    None
                }
            },
            None => None,
        };

        let _permit = match &cfg.bulkhead {
            Some(bh) => {
                let bulkhead = self.bulkhead_for(policy, bh);
                self.metrics.record_bulkhead_queue(policy, bulkhead.queued());
                match bulkhead.acquire().await {
                    Ok(permit) => Some(permit),
                    Err(BulkheadError::Full { max_concurrent }) => {
                        return Err(AttemptFailure::Fatal(ExecuteError::BulkheadFull {
                            service: policy.to_string(),
                            max_concurrent,
                        }));
                    }
                    Err(BulkheadError::QueueTimeout { waited }) => {
                        return Err(AttemptFailure::Fatal(ExecuteError::BulkheadQueueTimeout {
                            service: policy.to_string(),
                            waited,
                        }));
                    }
                }
            }
            None => None,
        };

        if let Some(rl) = &cfg.rate_limit {
            let limiter = self.limiter_for(policy, rl);
            let admitted = limiter.admit(Instant::now());
            self.metrics.record_rate_limit(policy, !admitted);
            if !admitted {
                return Err(AttemptFailure::Fatal(ExecuteError::RateLimited {
                    service: policy.to_string(),
                }));
            }
        }

        let budget = cfg
            .timeout
            .as_ref()
            .map(|t| resolve_timeout(t, options.timeout));
        let result = match budget {
            Some(budget) => match tokio::time::timeout(budget, operation()).await {
                Ok(result) => result,
                Err(_) => {
                    self.record_outcome(policy, cfg, false).await;
                    return Err(AttemptFailure::Retryable(ExecuteError::Timeout {
                        service: policy.to_string(),
                        budget,
                    }));
                }
            },
            None => operation().await,
        };

        match result {
            Ok(value) => {
                self.record_outcome(policy, cfg, true).await;
                Ok(value)
            }
            Err(err) => {
                self.record_outcome(policy, cfg, false).await;
                if retryable(&err) {
                    Err(AttemptFailure::Retryable(ExecuteError::Application(err)))
                } else {
                    Err(AttemptFailure::Fatal(ExecuteError::Application(err)))
                }
            }
        }
    }

    /// Reports an attempt outcome to the breaker. Recording must not mask
    /// the attempt's own result, so store errors are logged and dropped.
    async fn record_outcome(&self, policy: &str, cfg: &ResiliencePolicy, success: bool) {
        let cb = match &cfg.circuit_breaker {
            Some(cb) => cb,
            None => return,
        };
        let recorded = if success {
            self.breaker.record_success(policy, cb).await
        } else {
            self.breaker.record_failure(policy, cb).await
        };
        if let Err(err) = recorded {
            tracing::warn!(policy, error = %err, "failed to record call outcome");
        }
    }

    /// Returns the live bulkhead for `policy`, rebuilding it when the
    /// configured limits changed.
    fn bulkhead_for(&self, policy: &str, config: &BulkheadConfig) -> Bulkhead {
        let mut bulkheads = self.bulkheads.lock().unwrap_or_else(|e| e.into_inner());
        match bulkheads.get(policy) {
            Some(entry) if entry.config == *config => entry.bulkhead.clone(),
            _ => {
                let bulkhead = Bulkhead::new(config);
                bulkheads.insert(
                    policy.to_string(),
                    BulkheadEntry {
                        config: *config,
                        bulkhead: bulkhead.clone(),
                    },
                );
                bulkhead
            }
        }
    }

    fn limiter_for(&self, policy: &str, config: &RateLimitConfig) -> SharedRateLimiter {
        let mut limiters = self.limiters.lock().unwrap_or_else(|e| e.into_inner());
        match limiters.get(policy) {
            Some(entry) if entry.config == *config => entry.limiter.clone(),
            _ => {
                let limiter = SharedRateLimiter::new(config, Instant::now());
                limiters.insert(
                    policy.to_string(),
                    LimiterEntry {
                        config: *config,
                        limiter: limiter.clone(),
                    },
                );
                limiter
            }
        }
    }

    fn report<T, E>(&self, policy: &str, report: &ExecutionReport<T, E>) {
        let execution = ExecutionMetrics {
            policy: policy.to_string(),
            success: report.outcome.is_ok(),
            attempts: report.attempts,
            latency: report.elapsed,
            code: report.outcome.as_ref().err().map(ExecuteError::code),
        };
        self.metrics.record_execution(&execution);
    }

    /// The circuit record currently persisted for `service`, if any.
    pub async fn circuit_state(
        &self,
        service: &str,
    ) -> Result<Option<CircuitBreakerState>, StoreError> {
        self.breaker.current_state(service).await
    }

    /// Clears the persisted circuit record so the next call starts closed.
    pub async fn reset_circuit(&self, service: &str) -> Result<bool, StoreError> {
        self.breaker.reset(service).await
    }

    /// Hit, miss, and eviction counters for the policy cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.repository.cache_stats()
    }

    /// The repository backing this executor, for admin surfaces that must
    /// share its cache invalidation.
    pub fn repository(&self) -> &Arc<CachedPolicyRepository> {
        &self.repository
    }
}

fn resolve_timeout(cfg: &TimeoutConfig, requested: Option<Duration>) -> Duration {
    let budget = requested.unwrap_or(cfg.default);
    match cfg.max {
        Some(max) => budget.min(max),
        None => budget,
    }
}

type CircuitListener = Box<dyn Fn(&CircuitBreakerEvent) + Send + Sync>;

/// Builds a [`ResilienceExecutor`] with custom cache sizing, metrics, and
/// circuit event subscribers.
pub struct ExecutorBuilder {
    store: Arc<dyn RemoteStore>,
    repository: RepositoryConfig,
    metrics: Arc<dyn MetricsRecorder>,
    circuit_listeners: Vec<CircuitListener>,
}

impl ExecutorBuilder {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            repository: RepositoryConfig::default(),
            metrics: Arc::new(NoopMetrics),
            circuit_listeners: Vec::new(),
        }
    }

    /// Number of policies held by the in-process cache.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.repository.cache_capacity = capacity;
        self
    }

    /// How long a cached policy is served without consulting the store.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.repository.ttl = ttl;
        self
    }

    /// Extra window past the TTL during which a stale policy may still be
    /// served if the store is unreachable.
    pub fn staleness_grace(mut self, grace: Duration) -> Self {
        self.repository.staleness_grace = grace;
        self
    }

    /// Sink for execution, retry, rate limit, bulkhead, and circuit
    /// metrics.
    pub fn metrics(mut self, recorder: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = recorder;
        self
    }

    /// Subscribes `listener` to circuit transitions and rejections.
    pub fn on_circuit_event<F>(mut self, listener: F) -> Self
    where
        F: Fn(&CircuitBreakerEvent) + Send + Sync + 'static,
    {
        self.circuit_listeners.push(Box::new(listener));
        self
    }

    pub fn build(self) -> ResilienceExecutor {
        let repository = Arc::new(CachedPolicyRepository::new(
            Arc::clone(&self.store),
            self.repository,
        ));

        let mut breaker = CircuitBreaker::new(Arc::clone(&self.store));
        let recorder = Arc::clone(&self.metrics);
        breaker.subscribe(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::StateTransition { service, to, .. } = event {
                recorder.record_circuit_state(service, to.as_str());
            }
        }));
        for listener in self.circuit_listeners {
            breaker.subscribe(FnListener::new(move |event: &CircuitBreakerEvent| {
                listener(event)
            }));
        }

        ResilienceExecutor {
            repository,
            breaker: Arc::new(breaker),
            limiters: Mutex::new(HashMap::new()),
            bulkheads: Mutex::new(HashMap::new()),
            metrics: self.metrics,
        }
    }
}

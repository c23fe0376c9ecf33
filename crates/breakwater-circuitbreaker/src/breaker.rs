use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

use breakwater_core::events::{EventListener, EventListeners};
use breakwater_policy::model::CircuitBreakerConfig;
use breakwater_policy::state::{CircuitBreakerState, CircuitState};
use breakwater_store::error::StoreError;
use breakwater_store::remote::{RemoteStore, StateSave};

use crate::events::CircuitBreakerEvent;

/// Outcome of an admission check.
#[derive(Debug)]
pub enum Admission {
    /// The breaker is Closed; the call proceeds normally.
    Admitted,
    /// The breaker is Half-Open; the call proceeds as a probe. Dropping the
    /// guard returns the probe slot.
    Probe(HalfOpenGuard),
    /// The call must not run.
    Rejected {
        /// Remaining cool-down when the breaker is Open; `None` when the
        /// Half-Open probe quota is taken.
        retry_after: Option<Duration>,
    },
}

/// Per-service circuit breaker backed by the shared store.
///
/// The breaker keeps no authoritative state of its own. Admission and
/// outcome recording read the persisted record, decide, and write back with
/// the optimistic-concurrency version; on conflict they re-read and
/// re-decide. Only the Half-Open probe accounting is process-local, since
/// it bounds concurrent probes issued by this instance.
pub struct CircuitBreaker {
    store: Arc<dyn RemoteStore>,
    probes: Mutex<HashMap<String, Arc<AtomicUsize>>>,
    listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreaker {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            probes: Mutex::new(HashMap::new()),
            listeners: EventListeners::new(),
        }
    }

    /// Registers a listener for breaker events. Call before the breaker is
    /// shared.
    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: EventListener<CircuitBreakerEvent> + 'static,
    {
        self.listeners.add(listener);
    }

    /// Checks whether a call to `service` may run right now.
    ///
    /// A missing record is created lazily as Closed. When the breaker is
    /// Open and the cool-down has elapsed, this check performs the lazy
    /// Open to Half-Open transition before deciding.
    pub async fn admit(
        &self,
        service: &str,
        config: &CircuitBreakerConfig,
    ) -> Result<Admission, StoreError> {
        loop {
            let state = match self.store.get_state(service).await? {
                Some(state) => state,
                None => {
                    let fresh = CircuitBreakerState::new(service, SystemTime::now());
                    match self.store.save_state(&fresh).await? {
                        StateSave::Saved { .. } => return Ok(Admission::Admitted),
                        // Another caller created the record first; re-read.
                        StateSave::Conflict { .. } => continue,
                    }
                }
            };

            match state.state {
                CircuitState::Closed => return Ok(Admission::Admitted),
                CircuitState::Open => {
                    let elapsed = SystemTime::now()
                        .duration_since(state.last_state_change)
                        .unwrap_or_default();
                    if elapsed < config.timeout {
                        self.emit_rejected(service);
                        return Ok(Admission::Rejected {
                            retry_after: Some(config.timeout - elapsed),
                        });
                    }

                    let mut next = state.clone();
                    next.state = CircuitState::HalfOpen;
                    next.failure_count = 0;
                    next.success_count = 0;
                    next.last_state_change = SystemTime::now();
                    if self.commit(&state, next).await? {
                        return Ok(self.probe_admission(service, config));
                    }
                    // Lost the transition race; re-read and re-decide.
                }
                CircuitState::HalfOpen => return Ok(self.probe_admission(service, config)),
            }
        }
    }

    /// Records a successful call outcome for `service`.
    pub async fn record_success(
        &self,
        service: &str,
        config: &CircuitBreakerConfig,
    ) -> Result<(), StoreError> {
        loop {
            let state = match self.store.get_state(service).await? {
                Some(state) => state,
                None => return Ok(()),
            };

            match state.state {
                CircuitState::Closed => {
                    if state.failure_count == 0 {
                        return Ok(());
                    }
                    let mut next = state.clone();
                    next.failure_count = 0;
                    if self.commit(&state, next).await? {
                        return Ok(());
                    }
                }
                CircuitState::HalfOpen => {
                    let mut next = state.clone();
                    next.success_count += 1;
                    if next.success_count >= config.success_threshold {
                        next.state = CircuitState::Closed;
                        next.failure_count = 0;
                        next.success_count = 0;
                        next.last_state_change = SystemTime::now();
                    }
                    if self.commit(&state, next).await? {
                        return Ok(());
                    }
                }
                // A call admitted earlier finished after the breaker
                // opened; its outcome no longer matters.
                CircuitState::Open => return Ok(()),
            }
        }
    }

    /// Records a failed call outcome for `service`.
    pub async fn record_failure(
        &self,
        service: &str,
        config: &CircuitBreakerConfig,
    ) -> Result<(), StoreError> {
        loop {
            let state = match self.store.get_state(service).await? {
                Some(state) => state,
                None => return Ok(()),
            };

            match state.state {
                CircuitState::Closed => {
                    let mut next = state.clone();
                    next.failure_count += 1;
                    next.last_failure_time = Some(SystemTime::now());
                    if next.failure_count >= config.failure_threshold {
                        next.state = CircuitState::Open;
                        next.failure_count = 0;
                        next.success_count = 0;
                        next.last_state_change = SystemTime::now();
                    }
                    if self.commit(&state, next).await? {
                        return Ok(());
                    }
                }
                CircuitState::HalfOpen => {
                    // One failed probe is enough evidence; reopen.
                    let mut next = state.clone();
                    next.state = CircuitState::Open;
                    next.failure_count = 0;
                    next.success_count = 0;
                    next.last_failure_time = Some(SystemTime::now());
                    next.last_state_change = SystemTime::now();
                    if self.commit(&state, next).await? {
                        return Ok(());
                    }
                }
                CircuitState::Open => return Ok(()),
            }
        }
    }

    /// The persisted record for `service`, if one exists.
    pub async fn current_state(
        &self,
        service: &str,
    ) -> Result<Option<CircuitBreakerState>, StoreError> {
        self.store.get_state(service).await
    }

    /// Administrative reset: deletes the persisted record and the local
    /// probe accounting. The next execution starts from a fresh Closed
    /// record.
    pub async fn reset(&self, service: &str) -> Result<bool, StoreError> {
        let existed = self.store.delete_state(service).await?;
        let mut probes = self.probes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(counter) = probes.remove(service) {
            counter.store(0, Ordering::Release);
        }
        Ok(existed)
    }

    /// Writes `next` against the version read in `previous`. Returns
    /// whether the write landed; a conflict means another writer got there
    /// first.
    async fn commit(
        &self,
        previous: &CircuitBreakerState,
        next: CircuitBreakerState,
    ) -> Result<bool, StoreError> {
        match self.store.save_state(&next).await? {
            StateSave::Saved { version } => {
                if next.state != previous.state {
                    tracing::debug!(
                        service = %next.service_name,
                        from = %previous.state,
                        to = %next.state,
                        version,
                        "circuit state transitioned"
                    );
                    self.listeners.emit(&CircuitBreakerEvent::StateTransition {
                        service: next.service_name.clone(),
                        from: previous.state,
                        to: next.state,
                        at: Instant::now(),
                    });
                }
                Ok(true)
            }
            StateSave::Conflict { .. } => Ok(false),
        }
    }

    fn probe_admission(&self, service: &str, config: &CircuitBreakerConfig) -> Admission {
        match self.try_probe(service, config) {
            Some(guard) => Admission::Probe(guard),
            None => {
                self.emit_rejected(service);
                Admission::Rejected { retry_after: None }
            }
        }
    }

    /// Takes a probe slot if fewer than `probe_count` probes from this
    /// instance are in flight. Slots from an earlier Half-Open episode may
    /// still be draining; they free themselves as their guards drop.
    fn try_probe(&self, service: &str, config: &CircuitBreakerConfig) -> Option<HalfOpenGuard> {
        let counter = self.probe_counter(service);
        let limit = config.probe_count.max(1) as usize;
        let mut in_flight = counter.load(Ordering::Acquire);
        loop {
            if in_flight >= limit {
                return None;
            }
            match counter.compare_exchange(
                in_flight,
                in_flight + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(HalfOpenGuard { counter }),
                Err(actual) => in_flight = actual,
            }
        }
    }

    fn probe_counter(&self, service: &str) -> Arc<AtomicUsize> {
        let mut probes = self.probes.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            probes
                .entry(service.to_string())
                .or_insert_with(|| Arc::new(AtomicUsize::new(0))),
        )
    }

    fn emit_rejected(&self, service: &str) {
        self.listeners.emit(&CircuitBreakerEvent::CallRejected {
            service: service.to_string(),
            at: Instant::now(),
        });
    }
}

/// Occupies one Half-Open probe slot; the slot frees when the guard drops.
#[derive(Debug)]
pub struct HalfOpenGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for HalfOpenGuard {
    fn drop(&mut self) {
        // A reset may have zeroed the counter while this probe was in
        // flight; never wrap below zero.
        let _ = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}

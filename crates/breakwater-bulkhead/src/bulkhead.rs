use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use breakwater_policy::model::BulkheadConfig;

use crate::error::BulkheadError;

/// Bounded concurrency plus a bounded, time-limited wait queue.
///
/// Clones share the same slots and queue. Waiters are served in arrival
/// order when a slot frees up.
#[derive(Debug, Clone)]
pub struct Bulkhead {
    permits: Arc<Semaphore>,
    queue: Arc<Semaphore>,
    max_concurrent: usize,
    max_queue: usize,
    queue_timeout: Duration,
}

impl Bulkhead {
    pub fn new(config: &BulkheadConfig) -> Self {
        let max_concurrent = config.max_concurrent as usize;
        let max_queue = config.max_queue as usize;
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            queue: Arc::new(Semaphore::new(max_queue)),
            max_concurrent,
            max_queue,
            queue_timeout: config.queue_timeout,
        }
    }

    /// Acquires an execution slot, queueing when all slots are busy.
    ///
    /// The returned permit releases its slot on drop, including when the
    /// guarded operation fails or panics, so permits cannot leak.
    pub async fn acquire(&self) -> Result<BulkheadPermit, BulkheadError> {
        if let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() {
            return Ok(BulkheadPermit { _permit: permit });
        }

        // No free slot: take a queue position or reject outright.
        let queue_slot = match self.queue.try_acquire() {
            Ok(slot) => slot,
            Err(_) => {
                return Err(BulkheadError::Full {
                    max_concurrent: self.max_concurrent,
                })
            }
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.queue_timeout,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await;
        drop(queue_slot);

        match outcome {
            Ok(Ok(permit)) => Ok(BulkheadPermit { _permit: permit }),
            Ok(Err(_)) => Err(BulkheadError::Full {
                max_concurrent: self.max_concurrent,
            }),
            Err(_) => Err(BulkheadError::QueueTimeout {
                waited: started.elapsed(),
            }),
        }
    }

    /// Calls currently holding an execution slot.
    pub fn active(&self) -> usize {
        self.max_concurrent - self.permits.available_permits()
    }

    /// Calls currently waiting in the queue.
    pub fn queued(&self) -> usize {
        self.max_queue - self.queue.available_permits()
    }

    /// Configured concurrency ceiling.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }
}

/// An execution slot. Dropping it releases the slot to the next waiter.
#[derive(Debug)]
pub struct BulkheadPermit {
    _permit: OwnedSemaphorePermit,
}

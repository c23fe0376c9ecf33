use std::time::Duration;

use thiserror::Error;

/// Rejection from bulkhead admission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkheadError {
    /// Every slot is in use and the wait queue is at capacity.
    #[error("bulkhead full: {max_concurrent} calls in flight and queue at capacity")]
    Full {
        /// Configured concurrency ceiling.
        max_concurrent: usize,
    },

    /// A queue position was obtained but no slot freed up in time.
    #[error("queued call timed out after {waited:?}")]
    QueueTimeout {
        /// How long the call spent waiting.
        waited: Duration,
    },
}

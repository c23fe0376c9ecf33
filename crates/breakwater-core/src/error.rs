//! Common error type for guarded executions.
//!
//! Every rejection the engine can produce (circuit open, rate limited,
//! bulkhead full, timeout, retries exhausted) is a variant of
//! [`ExecuteError<E>`], with the application's own error preserved in the
//! `Application` variant. Callers match on the variant, or use the `is_*`
//! helpers and [`ExecuteError::code`] when they only need the category.
//!
//! ```rust
//! use breakwater_core::ExecuteError;
//!
//! # #[derive(Debug)]
//! # struct AppError;
//! # impl std::fmt::Display for AppError {
//! #     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { Ok(()) }
//! # }
//! # impl std::error::Error for AppError {}
//! fn handle_error(error: ExecuteError<AppError>) {
//!     match error {
//!         ExecuteError::CircuitOpen { service, .. } => {
//!             eprintln!("circuit for {} is open, backing off", service);
//!         }
//!         ExecuteError::RateLimited { service } => {
//!             eprintln!("rate limited on {}", service);
//!         }
//!         ExecuteError::Application(app_err) => {
//!             eprintln!("operation failed: {:?}", app_err);
//!         }
//!         other => eprintln!("rejected: {}", other),
//!     }
//! }
//! ```

use std::fmt;
use std::time::Duration;

/// Error returned by a guarded execution.
///
/// # Type Parameters
///
/// - `E`: the application-specific error type returned by the wrapped
///   operation
#[derive(Debug, Clone)]
pub enum ExecuteError<E> {
    /// Circuit breaker is open; the call was rejected without running the
    /// operation.
    CircuitOpen {
        /// Service the policy guards.
        service: String,
        /// Remaining cool-down before the breaker will probe again, when
        /// known.
        retry_after: Option<Duration>,
    },

    /// Rate limiter denied admission for the current window.
    RateLimited {
        /// Service the policy guards.
        service: String,
    },

    /// Bulkhead concurrency limit reached and the wait queue is full.
    BulkheadFull {
        /// Service the policy guards.
        service: String,
        /// Configured concurrency ceiling.
        max_concurrent: usize,
    },

    /// A queued call was not admitted within the configured queue timeout.
    BulkheadQueueTimeout {
        /// Service the policy guards.
        service: String,
        /// How long the call waited before giving up.
        waited: Duration,
    },

    /// The operation ran longer than its time budget.
    Timeout {
        /// Service the policy guards.
        service: String,
        /// The budget that was exceeded.
        budget: Duration,
    },

    /// Every attempt allowed by the retry policy failed; wraps the last
    /// observed failure.
    RetryExhausted {
        /// Service the policy guards.
        service: String,
        /// Attempts made, including the first call.
        attempts: u32,
        /// The failure from the final attempt.
        last: Box<ExecuteError<E>>,
    },

    /// The wrapped operation itself returned an error.
    Application(E),
}

impl<E> fmt::Display for ExecuteError<E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::CircuitOpen {
                service,
                retry_after,
            } => match retry_after {
                Some(d) => write!(
                    f,
                    "circuit breaker for '{}' is open, retry after {:?}",
                    service, d
                ),
                None => write!(f, "circuit breaker for '{}' is open", service),
            },
            ExecuteError::RateLimited { service } => {
                write!(f, "rate limit exceeded for '{}'", service)
            }
            ExecuteError::BulkheadFull {
                service,
                max_concurrent,
            } => write!(
                f,
                "bulkhead for '{}' is full ({} concurrent calls)",
                service, max_concurrent
            ),
            ExecuteError::BulkheadQueueTimeout { service, waited } => write!(
                f,
                "bulkhead queue timeout for '{}' after {:?}",
                service, waited
            ),
            ExecuteError::Timeout { service, budget } => {
                write!(f, "operation for '{}' timed out after {:?}", service, budget)
            }
            ExecuteError::RetryExhausted {
                service,
                attempts,
                last,
            } => write!(
                f,
                "retries exhausted for '{}' after {} attempts: {}",
                service, attempts, last
            ),
            ExecuteError::Application(e) => write!(f, "application error: {}", e),
        }
    }
}

impl<E> std::error::Error for ExecuteError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExecuteError::RetryExhausted { last, .. } => Some(last.as_ref()),
            ExecuteError::Application(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> ExecuteError<E> {
    /// Returns `true` if the circuit breaker rejected the call.
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ExecuteError::CircuitOpen { .. })
    }

    /// Returns `true` if the rate limiter rejected the call.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ExecuteError::RateLimited { .. })
    }

    /// Returns `true` if the bulkhead rejected the call outright.
    pub fn is_bulkhead_full(&self) -> bool {
        matches!(self, ExecuteError::BulkheadFull { .. })
    }

    /// Returns `true` if the call timed out waiting in the bulkhead queue.
    pub fn is_bulkhead_queue_timeout(&self) -> bool {
        matches!(self, ExecuteError::BulkheadQueueTimeout { .. })
    }

    /// Returns `true` if the operation exceeded its time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecuteError::Timeout { .. })
    }

    /// Returns `true` if the retry policy was exhausted.
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, ExecuteError::RetryExhausted { .. })
    }

    /// Returns `true` if the wrapped operation itself failed.
    pub fn is_application(&self) -> bool {
        matches!(self, ExecuteError::Application(_))
    }

    /// Stable machine-readable code for the error category.
    pub fn code(&self) -> &'static str {
        match self {
            ExecuteError::CircuitOpen { .. } => "CIRCUIT_OPEN",
            ExecuteError::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            ExecuteError::BulkheadFull { .. } => "BULKHEAD_FULL",
            ExecuteError::BulkheadQueueTimeout { .. } => "BULKHEAD_QUEUE_TIMEOUT",
            ExecuteError::Timeout { .. } => "TIMEOUT",
            ExecuteError::RetryExhausted { .. } => "RETRY_EXHAUSTED",
            ExecuteError::Application(_) => "APPLICATION",
        }
    }

    /// The service name this rejection applies to, when the variant carries
    /// one.
    pub fn service(&self) -> Option<&str> {
        match self {
            ExecuteError::CircuitOpen { service, .. }
            | ExecuteError::RateLimited { service }
            | ExecuteError::BulkheadFull { service, .. }
            | ExecuteError::BulkheadQueueTimeout { service, .. }
            | ExecuteError::Timeout { service, .. }
            | ExecuteError::RetryExhausted { service, .. } => Some(service),
            ExecuteError::Application(_) => None,
        }
    }

    /// Extracts the application error, if this is an `Application` variant.
    pub fn application_error(self) -> Option<E> {
        match self {
            ExecuteError::Application(e) => Some(e),
            _ => None,
        }
    }

    /// Maps the application error using a function, leaving every other
    /// variant intact. A wrapped `RetryExhausted` failure is mapped
    /// recursively.
    pub fn map_application<F, T>(self, f: F) -> ExecuteError<T>
    where
        F: FnOnce(E) -> T,
    {
        match self {
            ExecuteError::CircuitOpen {
                service,
                retry_after,
            } => ExecuteError::CircuitOpen {
                service,
                retry_after,
            },
            ExecuteError::RateLimited { service } => ExecuteError::RateLimited { service },
            ExecuteError::BulkheadFull {
                service,
                max_concurrent,
            } => ExecuteError::BulkheadFull {
                service,
                max_concurrent,
            },
            ExecuteError::BulkheadQueueTimeout { service, waited } => {
                ExecuteError::BulkheadQueueTimeout { service, waited }
            }
            ExecuteError::Timeout { service, budget } => {
                ExecuteError::Timeout { service, budget }
            }
            ExecuteError::RetryExhausted {
                service,
                attempts,
                last,
            } => ExecuteError::RetryExhausted {
                service,
                attempts,
                last: Box::new(last.map_application(f)),
            },
            ExecuteError::Application(e) => ExecuteError::Application(f(e)),
        }
    }
}

//! Concurrency isolation for breakwater.
//!
//! A [`Bulkhead`] lets at most `max_concurrent` calls run at once. Calls
//! beyond that wait in arrival order in a queue bounded by `max_queue`, for
//! at most `queue_timeout`. Everything else is rejected immediately, which
//! keeps a degraded dependency from absorbing every task in the process.

mod bulkhead;
mod error;

pub use bulkhead::{Bulkhead, BulkheadPermit};
pub use error::BulkheadError;

//! Circuit breaker for breakwater.
//!
//! The breaker record lives in the shared remote store, so every engine
//! instance guarding a service sees the same state. Instead of a
//! distributed lock, every write carries the version the writer read;
//! losers of a racing write re-read and re-decide ([`StateSave::Conflict`]).
//!
//! The Open to Half-Open transition is lazy: nothing fires on a timer.
//! Whichever admission check first arrives after the cool-down performs the
//! transition and becomes a probe candidate.
//!
//! [`StateSave::Conflict`]: breakwater_store::StateSave

pub mod breaker;
pub mod events;

pub use breaker::{Admission, CircuitBreaker, HalfOpenGuard};
pub use events::CircuitBreakerEvent;

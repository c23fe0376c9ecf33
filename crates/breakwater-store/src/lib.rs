//! Policy and circuit state persistence for breakwater.
//!
//! The shared remote store ([`RemoteStore`]) is the source of truth for
//! policies and breaker state. In front of it sits a bounded, TTL-aware LRU
//! cache ([`PolicyCache`]) that [`CachedPolicyRepository`] keeps honest:
//! reads go cache-first, writes go through to the store and invalidate the
//! local entry, and a store outage falls back to a stale entry only within
//! a configured grace margin.
//!
//! Breaker state writes use optimistic concurrency: see
//! [`RemoteStore::save_state`] and [`StateSave`].

pub mod cache;
pub mod error;
pub mod memory;
pub mod remote;
pub mod repository;

pub use cache::{CacheLookup, CacheStats, PolicyCache};
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use remote::{RemoteStore, StateSave};
pub use repository::{CachedPolicyRepository, RepositoryConfig};

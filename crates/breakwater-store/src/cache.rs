use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;

use breakwater_policy::model::ResiliencePolicy;

/// Cache accounting exposed to the metrics collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// The entry is inside its TTL.
    Fresh(ResiliencePolicy),
    /// The entry outlived its TTL; `age` is the time since insertion. The
    /// entry stays cached so the repository can fall back to it during a
    /// store outage.
    Stale(ResiliencePolicy, Duration),
}

#[derive(Debug)]
struct Entry {
    policy: ResiliencePolicy,
    inserted_at: Instant,
}

/// Bounded LRU policy cache with TTL bookkeeping.
///
/// The cache is a disposable accelerator in front of the authoritative
/// store. A fresh read counts as a hit and refreshes recency; stale and
/// absent reads count as misses.
#[derive(Debug)]
pub struct PolicyCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl PolicyCache {
    /// A cache holding at most `capacity` policies, each fresh for `ttl`
    /// after insertion. A zero capacity falls back to 128.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(128).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Looks up `name` as of `now`.
    pub fn get(&self, name: &str, now: Instant) -> Option<CacheLookup> {
        let mut entries = self.lock();
        match entries.get(name) {
            Some(entry) => {
                let age = now.saturating_duration_since(entry.inserted_at);
                if age <= self.ttl {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Some(CacheLookup::Fresh(entry.policy.clone()))
                } else {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    Some(CacheLookup::Stale(entry.policy.clone(), age))
                }
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Inserts or replaces the entry for `policy.name` as of `now`.
    pub fn insert(&self, policy: ResiliencePolicy, now: Instant) {
        let mut entries = self.lock();
        let key = policy.name.clone();
        let displaced = entries.push(
            key.clone(),
            Entry {
                policy,
                inserted_at: now,
            },
        );
        // push returns the replaced entry for a same-key update too; only a
        // different key means the LRU victim was evicted.
        if let Some((displaced_key, _)) = displaced {
            if displaced_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Drops the entry for `name`. Returns whether one was cached.
    pub fn invalidate(&self, name: &str) -> bool {
        self.lock().pop(name).is_some()
    }

    /// Entries currently cached, fresh or stale.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.len(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

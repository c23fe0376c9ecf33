use std::sync::Arc;
use std::time::{Duration, Instant};

use breakwater_policy::model::ResiliencePolicy;

use crate::cache::{CacheLookup, CacheStats, PolicyCache};
use crate::error::StoreError;
use crate::remote::RemoteStore;

/// Tuning for the read-through cache.
#[derive(Debug, Clone, Copy)]
pub struct RepositoryConfig {
    /// Maximum cached policies.
    pub cache_capacity: usize,
    /// How long a cached policy is served without consulting the store.
    pub ttl: Duration,
    /// Extra time past the TTL during which a stale entry may still be
    /// served if the store is unreachable.
    pub staleness_grace: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 128,
            ttl: Duration::from_secs(30),
            staleness_grace: Duration::from_secs(10),
        }
    }
}

/// Two-tier policy repository: a bounded in-process LRU cache in front of
/// the shared remote store.
///
/// Reads go cache-first and repopulate on miss. Writes go through to the
/// store and then invalidate the local entry, so the next read refetches
/// the authoritative record instead of trusting a locally computed value.
pub struct CachedPolicyRepository {
    store: Arc<dyn RemoteStore>,
    cache: PolicyCache,
    config: RepositoryConfig,
}

impl CachedPolicyRepository {
    pub fn new(store: Arc<dyn RemoteStore>, config: RepositoryConfig) -> Self {
        let cache = PolicyCache::new(config.cache_capacity, config.ttl);
        Self {
            store,
            cache,
            config,
        }
    }

    /// Resolves the policy for `name`.
    ///
    /// During a store outage a stale cache entry is served as long as its
    /// age is within `ttl + staleness_grace`; past that the outage
    /// propagates to the caller.
    pub async fn get(&self, name: &str) -> Result<Option<ResiliencePolicy>, StoreError> {
        let now = Instant::now();
        let stale = match self.cache.get(name, now) {
            Some(CacheLookup::Fresh(policy)) => return Ok(Some(policy)),
            Some(CacheLookup::Stale(policy, age)) => Some((policy, age)),
            None => None,
        };

        match self.store.get_policy(name).await {
            Ok(Some(policy)) => {
                self.cache.insert(policy.clone(), now);
                Ok(Some(policy))
            }
            Ok(None) => {
                // The store is authoritative; drop any leftover stale entry.
                self.cache.invalidate(name);
                Ok(None)
            }
            Err(err) => match stale {
                Some((policy, age))
                    if age <= self.config.ttl + self.config.staleness_grace =>
                {
                    tracing::warn!(
                        policy = name,
                        age_ms = age.as_millis() as u64,
                        error = %err,
                        "store unavailable, serving stale policy within grace"
                    );
                    Ok(Some(policy))
                }
                _ => {
                    tracing::warn!(
                        policy = name,
                        error = %err,
                        "store unavailable and no cache entry within grace"
                    );
                    Err(err)
                }
            },
        }
    }

    /// Persists `policy` and invalidates the local entry.
    ///
    /// Returns the policy stamped with the store-assigned version.
    pub async fn save(&self, policy: &ResiliencePolicy) -> Result<ResiliencePolicy, StoreError> {
        let version = self.store.put_policy(policy).await?;
        self.cache.invalidate(&policy.name);
        tracing::debug!(policy = %policy.name, version, "policy saved, cache entry invalidated");
        let mut stamped = policy.clone();
        stamped.version = version;
        Ok(stamped)
    }

    /// Deletes the policy for `name` everywhere. Returns whether the store
    /// held one.
    pub async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let existed = self.store.delete_policy(name).await?;
        self.cache.invalidate(name);
        Ok(existed)
    }

    /// Names of every stored policy, sorted.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        self.store.list_policy_names().await
    }

    /// Drops the cached entry for `name` without touching the store.
    pub fn invalidate(&self, name: &str) -> bool {
        self.cache.invalidate(name)
    }

    /// Cache accounting for the metrics collaborator.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// The underlying shared store.
    pub fn store(&self) -> &Arc<dyn RemoteStore> {
        &self.store
    }
}

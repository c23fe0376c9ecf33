use async_trait::async_trait;

use breakwater_policy::model::ResiliencePolicy;
use breakwater_policy::state::CircuitBreakerState;

use crate::error::StoreError;

/// Outcome of an optimistic-concurrency state write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSave {
    /// The write landed; the stored record now carries `version`.
    Saved { version: u64 },
    /// Another writer advanced the record first. The caller re-reads and
    /// re-decides instead of overwriting.
    Conflict { current: u64 },
}

/// The shared key-value store every engine instance sits in front of.
///
/// Policy writes are last-write-wins; the store assigns each saved policy a
/// version one above the stored one. Breaker state writes are guarded: a
/// save carries the version the writer read, and the store refuses it with
/// [`StateSave::Conflict`] when the record moved in the meantime.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the policy for `name`, if present.
    async fn get_policy(&self, name: &str) -> Result<Option<ResiliencePolicy>, StoreError>;

    /// Persists `policy`, returning the version the store assigned.
    async fn put_policy(&self, policy: &ResiliencePolicy) -> Result<u64, StoreError>;

    /// Removes the policy for `name`. Returns whether one existed.
    async fn delete_policy(&self, name: &str) -> Result<bool, StoreError>;

    /// Names of every stored policy, sorted.
    async fn list_policy_names(&self) -> Result<Vec<String>, StoreError>;

    /// Fetches the breaker record for `service`, if present.
    async fn get_state(&self, service: &str) -> Result<Option<CircuitBreakerState>, StoreError>;

    /// Writes `state` if `state.version` still matches the stored record.
    ///
    /// A version of 0 means create-if-absent. On success the stored record
    /// carries `state.version + 1`, which is echoed back in
    /// [`StateSave::Saved`].
    async fn save_state(&self, state: &CircuitBreakerState) -> Result<StateSave, StoreError>;

    /// Removes the breaker record for `service`. Returns whether one
    /// existed.
    async fn delete_state(&self, service: &str) -> Result<bool, StoreError>;

    /// Cheap reachability probe for health checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

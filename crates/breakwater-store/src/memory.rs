use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use breakwater_policy::codec;
use breakwater_policy::model::ResiliencePolicy;
use breakwater_policy::state::CircuitBreakerState;

use crate::error::StoreError;
use crate::remote::{RemoteStore, StateSave};

/// In-process [`RemoteStore`] holding encoded records.
///
/// Records are kept in their wire form, so every read and write exercises
/// the codec exactly as a networked store would. Intended for tests and
/// single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    policies: RwLock<HashMap<String, (u64, Vec<u8>)>>,
    states: RwLock<HashMap<String, (u64, Vec<u8>)>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteStore for InMemoryStore {
    async fn get_policy(&self, name: &str) -> Result<Option<ResiliencePolicy>, StoreError> {
        let policies = self.policies.read().await;
        match policies.get(name) {
            Some((_, bytes)) => Ok(Some(codec::decode_policy(bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_policy(&self, policy: &ResiliencePolicy) -> Result<u64, StoreError> {
        let mut policies = self.policies.write().await;
        let next = policies.get(&policy.name).map(|(v, _)| v + 1).unwrap_or(1);
        let mut stamped = policy.clone();
        stamped.version = next;
        let bytes = codec::encode_policy(&stamped)?;
        policies.insert(stamped.name.clone(), (next, bytes));
        Ok(next)
    }

    async fn delete_policy(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.policies.write().await.remove(name).is_some())
    }

    async fn list_policy_names(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.policies.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn get_state(&self, service: &str) -> Result<Option<CircuitBreakerState>, StoreError> {
        let states = self.states.read().await;
        match states.get(service) {
            Some((_, bytes)) => Ok(Some(codec::decode_state(bytes)?)),
            None => Ok(None),
        }
    }

    async fn save_state(&self, state: &CircuitBreakerState) -> Result<StateSave, StoreError> {
        let mut states = self.states.write().await;
        let current = states.get(&state.service_name).map(|(v, _)| *v);
        match current {
            None if state.version == 0 => {
                let mut stamped = state.clone();
                stamped.version = 1;
                let bytes = codec::encode_state(&stamped)?;
                states.insert(stamped.service_name.clone(), (1, bytes));
                Ok(StateSave::Saved { version: 1 })
            }
            None => Ok(StateSave::Conflict { current: 0 }),
            Some(v) if v == state.version => {
                let mut stamped = state.clone();
                stamped.version = v + 1;
                let bytes = codec::encode_state(&stamped)?;
                states.insert(stamped.service_name.clone(), (v + 1, bytes));
                Ok(StateSave::Saved { version: v + 1 })
            }
            Some(v) => Ok(StateSave::Conflict { current: v }),
        }
    }

    async fn delete_state(&self, service: &str) -> Result<bool, StoreError> {
        Ok(self.states.write().await.remove(service).is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

//! Administrative policy lifecycle.
//!
//! [`PolicyAdmin`] is the write path: every mutation is validated before it
//! reaches the store, goes through the executor's repository so cached
//! copies are invalidated on the spot, and is announced to subscribed
//! listeners for audit trails and propagation hooks.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use breakwater_core::events::{EventListener, EventListeners, ResilienceEvent};
use breakwater_policy::model::ResiliencePolicy;
use breakwater_policy::validate::{validate, ValidationError};
use breakwater_store::error::StoreError;
use breakwater_store::repository::CachedPolicyRepository;

/// Failure on the administrative write path.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("policy '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("policy '{name}' not found")]
    NotFound { name: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AdminError {
    /// Stable machine-readable code for transport layers.
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::Validation(_) => ValidationError::CODE,
            AdminError::AlreadyExists { .. } => "POLICY_EXISTS",
            AdminError::NotFound { .. } => "POLICY_NOT_FOUND",
            AdminError::Store(err) => err.code(),
        }
    }
}

/// Policy lifecycle notifications.
#[derive(Debug, Clone)]
pub enum PolicyEvent {
    Created {
        name: String,
        version: u64,
        at: Instant,
    },
    Updated {
        name: String,
        version: u64,
        at: Instant,
    },
    Deleted {
        name: String,
        at: Instant,
    },
}

impl ResilienceEvent for PolicyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PolicyEvent::Created { .. } => "policy_created",
            PolicyEvent::Updated { .. } => "policy_updated",
            PolicyEvent::Deleted { .. } => "policy_deleted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            PolicyEvent::Created { at, .. }
            | PolicyEvent::Updated { at, .. }
            | PolicyEvent::Deleted { at, .. } => *at,
        }
    }

    fn service(&self) -> &str {
        match self {
            PolicyEvent::Created { name, .. }
            | PolicyEvent::Updated { name, .. }
            | PolicyEvent::Deleted { name, .. } => name,
        }
    }
}

/// Validated write access to stored policies.
///
/// Share the repository with the executor so admin writes invalidate the
/// same cache the read path serves from.
pub struct PolicyAdmin {
    repository: Arc<CachedPolicyRepository>,
    listeners: EventListeners<PolicyEvent>,
}

impl PolicyAdmin {
    pub fn new(repository: Arc<CachedPolicyRepository>) -> Self {
        Self {
            repository,
            listeners: EventListeners::new(),
        }
    }

    /// Subscribes `listener` to lifecycle events. Call before the admin
    /// handle is shared.
    pub fn subscribe<L>(&mut self, listener: L)
    where
        L: EventListener<PolicyEvent> + 'static,
    {
        self.listeners.add(listener);
    }

    /// Persists a brand-new policy and returns it with its assigned
    /// version.
    ///
    /// The existence check is read-then-write: two racing creates both
    /// land, and the later write wins with a higher version.
    pub async fn create(&self, policy: &ResiliencePolicy) -> Result<ResiliencePolicy, AdminError> {
        validate(policy)?;
        if self.repository.get(&policy.name).await?.is_some() {
            return Err(AdminError::AlreadyExists {
                name: policy.name.clone(),
            });
        }
        let saved = self.repository.save(policy).await?;
        tracing::info!(policy = %saved.name, version = saved.version, "policy created");
        self.listeners.emit(&PolicyEvent::Created {
            name: saved.name.clone(),
            version: saved.version,
            at: Instant::now(),
        });
        Ok(saved)
    }

    /// Replaces an existing policy and returns it with its new version.
    pub async fn update(&self, policy: &ResiliencePolicy) -> Result<ResiliencePolicy, AdminError> {
        validate(policy)?;
        if self.repository.get(&policy.name).await?.is_none() {
            return Err(AdminError::NotFound {
                name: policy.name.clone(),
            });
        }
        let saved = self.repository.save(policy).await?;
        tracing::info!(policy = %saved.name, version = saved.version, "policy updated");
        self.listeners.emit(&PolicyEvent::Updated {
            name: saved.name.clone(),
            version: saved.version,
            at: Instant::now(),
        });
        Ok(saved)
    }

    /// Creates or replaces, whichever applies.
    pub async fn upsert(&self, policy: &ResiliencePolicy) -> Result<ResiliencePolicy, AdminError> {
        validate(policy)?;
        let existed = self.repository.get(&policy.name).await?.is_some();
        let saved = self.repository.save(policy).await?;
        let event = if existed {
            tracing::info!(policy = %saved.name, version = saved.version, "policy updated");
            PolicyEvent::Updated {
                name: saved.name.clone(),
                version: saved.version,
                at: Instant::now(),
            }
        } else {
            tracing::info!(policy = %saved.name, version = saved.version, "policy created");
            PolicyEvent::Created {
                name: saved.name.clone(),
                version: saved.version,
                at: Instant::now(),
            }
        };
        self.listeners.emit(&event);
        Ok(saved)
    }

    /// Removes a stored policy.
    pub async fn delete(&self, name: &str) -> Result<(), AdminError> {
        if !self.repository.delete(name).await? {
            return Err(AdminError::NotFound {
                name: name.to_string(),
            });
        }
        tracing::info!(policy = name, "policy deleted");
        self.listeners.emit(&PolicyEvent::Deleted {
            name: name.to_string(),
            at: Instant::now(),
        });
        Ok(())
    }

    /// Fetches one policy through the shared cache.
    pub async fn get(&self, name: &str) -> Result<Option<ResiliencePolicy>, AdminError> {
        Ok(self.repository.get(name).await?)
    }

    /// Names of every stored policy, sorted.
    pub async fn list(&self) -> Result<Vec<String>, AdminError> {
        Ok(self.repository.list().await?)
    }
}

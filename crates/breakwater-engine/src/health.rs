//! Store reachability probe for readiness endpoints.

use std::sync::Arc;

use breakwater_store::remote::RemoteStore;

/// Result of one health probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy { reason: String },
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }

    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy { .. } => "unhealthy",
        }
    }

    /// Suggested status code for a readiness endpoint.
    pub fn http_status(&self) -> u16 {
        match self {
            HealthStatus::Healthy => 200,
            HealthStatus::Unhealthy { .. } => 503,
        }
    }
}

/// Answers whether the shared policy store is reachable.
///
/// The engine itself keeps working through a store outage by serving stale
/// cached policies, so this is a dependency check, not a liveness check.
pub struct HealthChecker {
    store: Arc<dyn RemoteStore>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    pub async fn check(&self) -> HealthStatus {
        match self.store.ping().await {
            Ok(()) => HealthStatus::Healthy,
            Err(err) => {
                tracing::warn!(error = %err, "policy store failed health probe");
                HealthStatus::Unhealthy {
                    reason: err.to_string(),
                }
            }
        }
    }
}

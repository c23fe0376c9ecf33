//! Policy-driven resilience execution.
//!
//! This crate ties the breakwater pattern crates together: it resolves a
//! [`ResiliencePolicy`](breakwater_policy::model::ResiliencePolicy) by
//! service name and runs caller operations under whatever subset of
//! circuit breaking, bulkheading, rate limiting, timeout, and retry the
//! policy configures.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use breakwater_engine::{PolicyAdmin, ResilienceExecutor};
//! use breakwater_policy::model::{ResiliencePolicy, RetryConfig};
//! use breakwater_store::memory::InMemoryStore;
//! use breakwater_store::remote::RemoteStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store: Arc<dyn RemoteStore> = Arc::new(InMemoryStore::new());
//! let executor = ResilienceExecutor::new(Arc::clone(&store));
//!
//! let admin = PolicyAdmin::new(Arc::clone(executor.repository()));
//! admin
//!     .create(&ResiliencePolicy::new("billing").with_retry(RetryConfig::default()))
//!     .await
//!     .unwrap();
//!
//! let reply: Result<&str, _> = executor
//!     .execute::<_, &str, _, _>("billing", || async { Ok("charged") })
//!     .await;
//! assert_eq!(reply.unwrap(), "charged");
//! # }
//! ```
//!
//! Operations run against the policy's stored configuration at call time;
//! saving a new policy version takes effect on the next execution without
//! restarting anything.

pub mod admin;
pub mod executor;
pub mod health;
pub mod layer;
#[cfg(feature = "metrics")]
pub mod recorder;

pub use admin::{AdminError, PolicyAdmin, PolicyEvent};
pub use executor::{ExecuteOptions, ExecutionReport, ExecutorBuilder, ResilienceExecutor};
pub use health::{HealthChecker, HealthStatus};
pub use layer::{ResilienceLayer, ResilienceService};
#[cfg(feature = "metrics")]
pub use recorder::MetricsFacade;

pub use breakwater_core::error::ExecuteError;

//! Policy value objects.
//!
//! All types here are plain data: cloneable, comparable, and serializable.
//! A policy is keyed by `name` and carries a store-assigned `version`;
//! clients never increment the version themselves.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::duration_ms;

/// Resilience configuration for one logical service.
///
/// Every sub-configuration is optional. A policy with all five absent is
/// valid but inert: the executor runs operations under it as a straight
/// pass-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResiliencePolicy {
    /// Logical service identifier this policy applies to.
    pub name: String,
    /// Monotonically increasing version, assigned by the store on save.
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulkhead: Option<BulkheadConfig>,
}

impl ResiliencePolicy {
    /// Creates an inert policy for `name` with no patterns configured.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 0,
            circuit_breaker: None,
            retry: None,
            timeout: None,
            rate_limit: None,
            bulkhead: None,
        }
    }

    /// Sets the circuit breaker configuration.
    pub fn with_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Some(config);
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retry = Some(config);
        self
    }

    /// Sets the timeout configuration.
    pub fn with_timeout(mut self, config: TimeoutConfig) -> Self {
        self.timeout = Some(config);
        self
    }

    /// Sets the rate limit configuration.
    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = Some(config);
        self
    }

    /// Sets the bulkhead configuration.
    pub fn with_bulkhead(mut self, config: BulkheadConfig) -> Self {
        self.bulkhead = Some(config);
        self
    }

    /// Returns `true` if at least one pattern is configured.
    pub fn has_any_pattern(&self) -> bool {
        self.circuit_breaker.is_some()
            || self.retry.is_some()
            || self.timeout.is_some()
            || self.rate_limit.is_some()
            || self.bulkhead.is_some()
    }
}

/// Circuit breaker thresholds and cool-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the breaker from Closed to Open.
    pub failure_threshold: u32,
    /// Successes required in Half-Open before the breaker closes.
    pub success_threshold: u32,
    /// Cool-down spent in Open before the breaker admits a probe.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    /// Concurrent probe calls admitted while Half-Open.
    pub probe_count: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(30),
            probe_count: 1,
        }
    }
}

/// Exponential backoff retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Upper bound on attempts, including the first call. 1 disables retry.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    #[serde(rename = "base_delay_ms", with = "duration_ms")]
    pub base_delay: Duration,
    /// Ceiling applied to the computed delay.
    #[serde(rename = "max_delay_ms", with = "duration_ms")]
    pub max_delay: Duration,
    /// Growth factor applied per attempt.
    pub multiplier: f64,
    /// Uniform jitter as a fraction of the computed delay, in `[0, 1]`.
    pub jitter_percent: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_percent: 0.1,
        }
    }
}

/// Per-call time budget for the guarded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Budget applied when the caller does not override it.
    #[serde(rename = "default_ms", with = "duration_ms")]
    pub default: Duration,
    /// Cap applied to any per-call override.
    #[serde(
        rename = "max_ms",
        default,
        with = "duration_ms::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub max: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(30),
            max: Some(Duration::from_secs(60)),
        }
    }
}

/// Admission algorithm used by the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitAlgorithm {
    /// Continuous refill with optional burst headroom.
    TokenBucket,
    /// Timestamp log over the trailing window.
    SlidingWindow,
}

impl RateLimitAlgorithm {
    /// Wire and metrics label for the algorithm.
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitAlgorithm::TokenBucket => "token_bucket",
            RateLimitAlgorithm::SlidingWindow => "sliding_window",
        }
    }
}

impl fmt::Display for RateLimitAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rate limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub algorithm: RateLimitAlgorithm,
    /// Permits granted per window.
    pub limit: u32,
    /// Length of the admission window.
    #[serde(rename = "window_ms", with = "duration_ms")]
    pub window: Duration,
    /// Extra capacity on top of `limit`, used by the token bucket only.
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            algorithm: RateLimitAlgorithm::TokenBucket,
            limit: 100,
            window: Duration::from_secs(1),
            burst_size: 10,
        }
    }
}

/// Bulkhead concurrency and queueing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkheadConfig {
    /// Calls allowed in flight simultaneously.
    pub max_concurrent: u32,
    /// Calls allowed to wait for a slot. 0 disables queueing.
    pub max_queue: u32,
    /// How long a queued call may wait before it is rejected.
    #[serde(rename = "queue_timeout_ms", with = "duration_ms")]
    pub queue_timeout: Duration,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            max_queue: 100,
            queue_timeout: Duration::from_secs(5),
        }
    }
}

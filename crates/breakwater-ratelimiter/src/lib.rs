//! Rate limiting admission for breakwater.
//!
//! Two algorithms sit behind a single closed enum so the executor never
//! cares which one a policy picked:
//!
//! - [`TokenBucket`]: capacity of `limit + burst_size` tokens, refilled
//!   continuously at `limit` tokens per `window`. Admission consumes one
//!   token.
//! - [`SlidingWindow`]: a timestamp log over the trailing `window`;
//!   admission requires fewer than `limit` calls inside it.
//!
//! Both are clock-driven: the caller passes the current [`Instant`] to
//! [`RateLimiter::admit`], and no background refill task exists. Adding an
//! algorithm means adding a variant, which the compiler then tracks through
//! every match.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use breakwater_policy::model::{RateLimitAlgorithm, RateLimitConfig};

/// A rate limiter configured from one policy's [`RateLimitConfig`].
#[derive(Debug)]
pub enum RateLimiter {
    TokenBucket(TokenBucket),
    SlidingWindow(SlidingWindow),
}

impl RateLimiter {
    /// Builds the limiter described by `config`, fully provisioned as of
    /// `now`.
    pub fn from_config(config: &RateLimitConfig, now: Instant) -> Self {
        match config.algorithm {
            RateLimitAlgorithm::TokenBucket => {
                RateLimiter::TokenBucket(TokenBucket::new(config, now))
            }
            RateLimitAlgorithm::SlidingWindow => {
                RateLimiter::SlidingWindow(SlidingWindow::new(config))
            }
        }
    }

    /// Admits or rejects one call arriving at `now`.
    pub fn admit(&mut self, now: Instant) -> bool {
        match self {
            RateLimiter::TokenBucket(bucket) => bucket.admit(now),
            RateLimiter::SlidingWindow(window) => window.admit(now),
        }
    }
}

/// Continuous-refill token bucket.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(config: &RateLimitConfig, now: Instant) -> Self {
        let capacity = f64::from(config.limit) + f64::from(config.burst_size);
        let window_secs = config.window.as_secs_f64();
        let refill_per_sec = if window_secs > 0.0 {
            f64::from(config.limit) / window_secs
        } else {
            f64::from(config.limit)
        };
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: now,
        }
    }

    fn admit(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.last_refill = now;
        self.tokens =
            (self.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Timestamp log over the trailing window.
#[derive(Debug)]
pub struct SlidingWindow {
    limit: usize,
    window: Duration,
    stamps: VecDeque<Instant>,
}

impl SlidingWindow {
    fn new(config: &RateLimitConfig) -> Self {
        Self {
            limit: config.limit as usize,
            window: config.window,
            stamps: VecDeque::with_capacity(config.limit as usize),
        }
    }

    fn admit(&mut self, now: Instant) -> bool {
        while let Some(front) = self.stamps.front() {
            if now.saturating_duration_since(*front) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
        if self.stamps.len() < self.limit {
            self.stamps.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Cheaply cloneable handle sharing one limiter across concurrent callers.
#[derive(Debug, Clone)]
pub struct SharedRateLimiter {
    inner: Arc<Mutex<RateLimiter>>,
}

impl SharedRateLimiter {
    pub fn new(config: &RateLimitConfig, now: Instant) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RateLimiter::from_config(config, now))),
        }
    }

    /// Admits or rejects one call arriving at `now`.
    ///
    /// The lock covers only the admission bookkeeping and is recovered if
    /// poisoned.
    pub fn admit(&self, now: Instant) -> bool {
        let mut limiter = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        limiter.admit(now)
    }
}

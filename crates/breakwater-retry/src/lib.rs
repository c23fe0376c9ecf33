//! Exponential backoff with jitter.
//!
//! Attempts are numbered from 1 (the first call, which never waits).
//! Attempt `k` waits `base_delay * multiplier^(k-2)`, capped at `max_delay`,
//! then perturbed by up to `jitter_percent` in either direction so that
//! synchronized callers do not retry in lockstep. The final delay never
//! drops below zero and never exceeds `max_delay`.
//!
//! The executor owns the loop; [`RetrySchedule`] only answers "how long to
//! sleep before the next attempt, if one is allowed".

use std::time::Duration;

use rand::Rng;

use breakwater_policy::model::RetryConfig;

/// Deterministic delay before attempt `attempt`, before jitter.
pub fn base_delay_for_attempt(config: &RetryConfig, attempt: u32) -> Duration {
    if attempt <= 1 {
        return Duration::ZERO;
    }
    let exp = (attempt - 2) as i32;
    let raw = config.base_delay.as_secs_f64() * config.multiplier.powi(exp);
    let capped = raw.min(config.max_delay.as_secs_f64());
    Duration::from_secs_f64(capped.max(0.0))
}

/// Perturbs `delay` by up to `jitter_percent` in either direction, drawn
/// uniformly. Floored at zero.
pub fn jittered(config: &RetryConfig, delay: Duration) -> Duration {
    if config.jitter_percent <= 0.0 || delay.is_zero() {
        return delay;
    }
    let base = delay.as_secs_f64();
    let spread = base * config.jitter_percent;
    let low = (base - spread).max(0.0);
    let high = base + spread;
    let sampled = rand::rng().random_range(low..=high);
    Duration::from_secs_f64(sampled.max(0.0))
}

/// Jittered delay before attempt `attempt`, clamped to `max_delay`.
pub fn delay_for_attempt(config: &RetryConfig, attempt: u32) -> Duration {
    jittered(config, base_delay_for_attempt(config, attempt)).min(config.max_delay)
}

/// Attempt bookkeeping for one logical call.
///
/// ```
/// use breakwater_policy::model::RetryConfig;
/// use breakwater_retry::RetrySchedule;
///
/// let mut schedule = RetrySchedule::new(RetryConfig::default());
/// assert_eq!(schedule.attempt(), 1);
/// assert!(schedule.next_backoff().is_some());
/// assert_eq!(schedule.attempt(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    config: RetryConfig,
    attempt: u32,
}

impl RetrySchedule {
    /// Starts a schedule positioned at the first attempt.
    pub fn new(config: RetryConfig) -> Self {
        Self { config, attempt: 1 }
    }

    /// The attempt number the caller is currently on, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Advances to the next attempt, returning the delay to sleep first, or
    /// `None` once `max_attempts` is exhausted.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }
        self.attempt += 1;
        Some(delay_for_attempt(&self.config, self.attempt))
    }
}

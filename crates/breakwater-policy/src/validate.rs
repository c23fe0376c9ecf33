//! Policy validation.
//!
//! [`validate`] accumulates every violation instead of stopping at the
//! first, so an administrative caller can surface the complete list of
//! problems in one round trip. Validation is pure: no I/O, no clock.

use std::fmt;
use std::time::Duration;

use crate::model::ResiliencePolicy;

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path of the offending field in the wire payload, e.g.
    /// `retry.max_attempts`.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    errors: Vec<FieldError>,
}

impl ValidationError {
    /// Stable machine-readable code for this error category.
    pub const CODE: &'static str = "INVALID_POLICY";

    /// The accumulated violations, in the order they were found.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Consumes the error, yielding the violations.
    pub fn into_errors(self) -> Vec<FieldError> {
        self.errors
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "policy validation failed: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Checks `policy` against the configuration ranges.
///
/// Returns `Ok(())` for an admissible policy, otherwise the full list of
/// violations. A policy with no sub-configurations is admissible as long as
/// its name is non-empty.
pub fn validate(policy: &ResiliencePolicy) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    if policy.name.trim().is_empty() {
        errors.push(FieldError {
            field: "name",
            message: "must not be empty".to_string(),
        });
    }

    if let Some(cb) = &policy.circuit_breaker {
        bounded_u32(
            &mut errors,
            "circuit_breaker.failure_threshold",
            cb.failure_threshold,
            1,
            100,
        );
        bounded_u32(
            &mut errors,
            "circuit_breaker.success_threshold",
            cb.success_threshold,
            1,
            10,
        );
        if cb.success_threshold > cb.failure_threshold {
            errors.push(FieldError {
                field: "circuit_breaker.success_threshold",
                message: "must not exceed failure_threshold".to_string(),
            });
        }
        bounded_duration(
            &mut errors,
            "circuit_breaker.timeout_ms",
            cb.timeout,
            Duration::from_secs(1),
            Duration::from_secs(300),
        );
        bounded_u32(&mut errors, "circuit_breaker.probe_count", cb.probe_count, 1, 10);
    }

    if let Some(retry) = &policy.retry {
        bounded_u32(&mut errors, "retry.max_attempts", retry.max_attempts, 1, 10);
        bounded_duration(
            &mut errors,
            "retry.base_delay_ms",
            retry.base_delay,
            Duration::from_millis(1),
            Duration::from_secs(10),
        );
        bounded_duration(
            &mut errors,
            "retry.max_delay_ms",
            retry.max_delay,
            Duration::from_secs(1),
            Duration::from_secs(300),
        );
        if retry.max_delay < retry.base_delay {
            errors.push(FieldError {
                field: "retry.max_delay_ms",
                message: "must not be less than base_delay_ms".to_string(),
            });
        }
        if !(1.0..=10.0).contains(&retry.multiplier) {
            errors.push(FieldError {
                field: "retry.multiplier",
                message: "must be between 1.0 and 10.0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&retry.jitter_percent) {
            errors.push(FieldError {
                field: "retry.jitter_percent",
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
    }

    if let Some(timeout) = &policy.timeout {
        bounded_duration(
            &mut errors,
            "timeout.default_ms",
            timeout.default,
            Duration::from_millis(100),
            Duration::from_secs(300),
        );
        if let Some(max) = timeout.max {
            bounded_duration(
                &mut errors,
                "timeout.max_ms",
                max,
                Duration::from_secs(1),
                Duration::from_secs(600),
            );
            if max < timeout.default {
                errors.push(FieldError {
                    field: "timeout.max_ms",
                    message: "must not be less than default_ms".to_string(),
                });
            }
        }
    }

    if let Some(rate) = &policy.rate_limit {
        bounded_u32(&mut errors, "rate_limit.limit", rate.limit, 1, 100_000);
        bounded_duration(
            &mut errors,
            "rate_limit.window_ms",
            rate.window,
            Duration::from_secs(1),
            Duration::from_secs(3600),
        );
        bounded_u32(&mut errors, "rate_limit.burst_size", rate.burst_size, 0, 10_000);
        if rate.burst_size > rate.limit {
            errors.push(FieldError {
                field: "rate_limit.burst_size",
                message: "must not exceed limit".to_string(),
            });
        }
    }

    if let Some(bulkhead) = &policy.bulkhead {
        bounded_u32(
            &mut errors,
            "bulkhead.max_concurrent",
            bulkhead.max_concurrent,
            1,
            10_000,
        );
        bounded_u32(&mut errors, "bulkhead.max_queue", bulkhead.max_queue, 0, 10_000);
        bounded_duration(
            &mut errors,
            "bulkhead.queue_timeout_ms",
            bulkhead.queue_timeout,
            Duration::from_millis(1),
            Duration::from_secs(30),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn bounded_u32(errors: &mut Vec<FieldError>, field: &'static str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(FieldError {
            field,
            message: format!("must be between {} and {}", min, max),
        });
    }
}

fn bounded_duration(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Duration,
    min: Duration,
    max: Duration,
) {
    if value < min || value > max {
        errors.push(FieldError {
            field,
            message: format!("must be between {:?} and {:?}", min, max),
        });
    }
}

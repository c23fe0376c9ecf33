//! Wire codec for the shared store.
//!
//! Policies and breaker state are stored as self-describing JSON records
//! with durations and timestamps flattened to integer milliseconds.
//! Encoding is canonical: decoding a payload produced here and re-encoding
//! it yields byte-identical output, which keeps version comparisons and
//! store-level deduplication honest.

use thiserror::Error;

use crate::model::ResiliencePolicy;
use crate::state::CircuitBreakerState;

/// Failure to move a record to or from its wire form.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("wire codec failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes a policy to its wire form.
pub fn encode_policy(policy: &ResiliencePolicy) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(policy)?)
}

/// Deserializes a policy from its wire form.
pub fn decode_policy(bytes: &[u8]) -> Result<ResiliencePolicy, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serializes a breaker state record to its wire form.
pub fn encode_state(state: &CircuitBreakerState) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(state)?)
}

/// Deserializes a breaker state record from its wire form.
pub fn decode_state(bytes: &[u8]) -> Result<CircuitBreakerState, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Serde adapter storing a `Duration` as integer milliseconds.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (value.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }

    /// Same encoding for `Option<Duration>`.
    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let ms = Option::<u64>::deserialize(deserializer)?;
            Ok(ms.map(Duration::from_millis))
        }
    }
}

/// Serde adapter storing a `SystemTime` as integer milliseconds since the
/// Unix epoch. Times before the epoch collapse to zero.
pub mod time_ms {
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    fn to_millis(value: &SystemTime) -> u64 {
        value
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    pub fn serialize<S>(value: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        to_millis(value).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_millis(ms))
    }

    /// Same encoding for `Option<SystemTime>`.
    pub mod option {
        use std::time::{Duration, SystemTime, UNIX_EPOCH};

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(value: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match value {
                Some(t) => serializer.serialize_some(&super::to_millis(t)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let ms = Option::<u64>::deserialize(deserializer)?;
            Ok(ms.map(|ms| UNIX_EPOCH + Duration::from_millis(ms)))
        }
    }
}

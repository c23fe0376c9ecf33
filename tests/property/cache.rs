//! Property tests for the policy cache.
//!
//! Invariants tested:
//! - The entry count never exceeds the configured capacity, for any
//!   sequence of inserts, reads, and invalidations
//! - The bound holds under concurrent insertion from multiple threads
//! - The stats snapshot agrees with the live entry count

use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use breakwater_policy::model::ResiliencePolicy;
use breakwater_store::PolicyCache;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: the cache holds at most `capacity` entries no matter how
    /// inserts, reads, and invalidations interleave.
    #[test]
    fn the_cache_never_outgrows_its_capacity(
        capacity in 1usize..=8,
        ops in proptest::collection::vec((0u8..12, 0u8..4), 1..=200),
    ) {
        let cache = PolicyCache::new(capacity, Duration::from_secs(60));

        for (key, kind) in ops {
            let name = format!("svc-{key}");
            match kind {
                0 | 1 => cache.insert(ResiliencePolicy::new(name.as_str()), Instant::now()),
                2 => {
                    let _ = cache.get(&name, Instant::now());
                }
                _ => {
                    let _ = cache.invalidate(&name);
                }
            }
            prop_assert!(cache.len() <= capacity);
        }

        prop_assert_eq!(cache.stats().size, cache.len());
    }

    /// Property: racing writers from several threads still leave the cache
    /// within its capacity, and the counters stay coherent.
    #[test]
    fn concurrent_inserts_respect_the_capacity_bound(
        capacity in 1usize..=8,
        batches in proptest::collection::vec(
            proptest::collection::vec(0u8..16, 1..=32),
            2..=4,
        ),
    ) {
        let cache = Arc::new(PolicyCache::new(capacity, Duration::from_secs(60)));

        let writers: Vec<_> = batches
            .into_iter()
            .map(|batch| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for key in batch {
                        let name = format!("svc-{key}");
                        cache.insert(ResiliencePolicy::new(name.as_str()), Instant::now());
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        prop_assert!(cache.len() <= capacity);
        prop_assert_eq!(cache.stats().size, cache.len());
    }
}

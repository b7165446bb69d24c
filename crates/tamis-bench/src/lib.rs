//! Benchmark profiles and utilities for the tamis sieve.
//!
//! - [`reference_config`]: 2^24 ceiling (2 MiB table), 2^18 segments
//! - [`stress_config`]: 2^28 ceiling (32 MiB table), default segments
//! - [`query_points`]: deterministic pseudo-random query values

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use tamis_buffer::PoolConfig;
use tamis_sieve::{Backing, SieveConfig};

/// Reference profile: 16M integers, 64 segments.
pub fn reference_config() -> SieveConfig {
    SieveConfig::with_ceiling(1 << 24, 1 << 18)
}

/// Reference profile backed by buffer pools.
pub fn reference_pooled_config() -> SieveConfig {
    SieveConfig {
        backing: Backing::Pooled(PoolConfig::default()),
        ..reference_config()
    }
}

/// Stress profile: 256M integers with the default segment size.
pub fn stress_config() -> SieveConfig {
    SieveConfig::with_ceiling(1 << 28, SieveConfig::DEFAULT_SEGMENT_SIZE)
}

/// `n` deterministic values in `[0, max)` derived from `seed`.
pub fn query_points(n: usize, max: u64, seed: u64) -> Vec<u64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (state >> 11) % max
        })
        .collect()
}

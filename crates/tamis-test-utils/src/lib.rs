//! Reference oracles and fixtures for tamis development.
//!
//! The oracles here are deliberately naive (trial division, a plain
//! `Vec<bool>` sieve) so they can be trusted without reference to the
//! engine under test. [`fixtures`] builds small-ceiling configurations and a
//! [`PrimeTable`](tamis_sieve::PrimeTable) backed by a precomputed list.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{pooled_config, small_config, ReferenceTable};

/// π(2^32): number of primes below 2^32.
pub const PRIMES_BELOW_2_32: u64 = 203_280_221;

/// Largest prime below 2^32.
pub const LARGEST_PRIME_BELOW_2_32: u64 = 4_294_967_291;

/// Primality by trial division over odd divisors.
pub fn is_prime_trial(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Ascending primes strictly below `max`, from a textbook `Vec<bool>` sieve.
pub fn primes_below(max: u64) -> Vec<u32> {
    let max = max as usize;
    if max < 3 {
        return Vec::new();
    }
    let mut composite = vec![false; max];
    let mut i = 2;
    while i * i < max {
        if !composite[i] {
            for m in (i * i..max).step_by(i) {
                composite[m] = true;
            }
        }
        i += 1;
    }
    (2..max)
        .filter(|&n| !composite[n])
        .map(|n| n as u32)
        .collect()
}

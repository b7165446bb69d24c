//! Seed primes: the odd primes in `[17, seed_limit)` that cross off
//! composites in every segment.

use tamis_buffer::Element;

use crate::bits;

/// Smallest seed; everything below is handled by the wheel.
pub const FIRST_SEED: u64 = 17;

/// A seed prime and the first multiple it may clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct SeedPrime {
    /// The prime.
    pub prime: u32,
    /// First odd multiple to clear, `prime²`. Smaller multiples have a
    /// smaller prime factor.
    pub cursor: u32,
}

impl SeedPrime {
    /// Seed for `prime` with its cursor at `prime²`.
    pub fn new(prime: u32) -> Self {
        Self {
            prime,
            cursor: prime * prime,
        }
    }
}

// SAFETY: two `u32` fields under `repr(C)` with no padding; the all-zero
// bit pattern is `SeedPrime { prime: 0, cursor: 0 }`.
#[allow(unsafe_code)]
unsafe impl Element for SeedPrime {
    const ZERO: Self = Self {
        prime: 0,
        cursor: 0,
    };
}

/// Classical sieve over odd `i ∈ [17, seed_limit)` on a wheel-seeded table.
///
/// Afterwards the bits below `seed_limit` are exact. Returns the number of
/// seeds.
pub fn sieve_seed_range(words: &mut [u32], seed_limit: u64) -> usize {
    let mut i = FIRST_SEED;
    while i * i < seed_limit {
        if bits::test(words, i) {
            let mut multiple = i * i;
            while multiple < seed_limit {
                bits::clear(words, multiple);
                multiple += 2 * i;
            }
        }
        i += 2;
    }
    (bits::count_below(words, seed_limit) - bits::count_below(words, FIRST_SEED)) as usize
}

/// Ascending seed primes surviving in `words` below `seed_limit`.
pub fn survivors(words: &[u32], seed_limit: u64) -> impl Iterator<Item = u32> + '_ {
    (FIRST_SEED..seed_limit)
        .step_by(2)
        .filter(move |&i| bits::test(words, i))
        .map(|i| i as u32)
}

/// Write the seeds into `out`, returning how many were written.
pub fn write_seeds(words: &[u32], seed_limit: u64, out: &mut [SeedPrime]) -> usize {
    out.iter_mut()
        .zip(survivors(words, seed_limit))
        .map(|(slot, prime)| *slot = SeedPrime::new(prime))
        .count()
}

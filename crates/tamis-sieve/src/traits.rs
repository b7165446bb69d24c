//! The query surface consumed by code that only needs prime lookups.
//!
//! Factorisation, GCD helpers and similar utilities depend on
//! [`PrimeTable`] rather than on [`Sieve`] directly, so they can run against
//! a reference implementation in tests.

use crate::engine::Sieve;
use crate::error::SieveError;
use crate::primes::Primes;

/// Read-side prime queries over `[0, ceiling)`.
pub trait PrimeTable {
    /// Sequence returned by [`enumerate`](Self::enumerate).
    type Primes<'a>: Iterator<Item = Result<u32, SieveError>>
    where
        Self: 'a;

    /// Exclusive upper bound of the table.
    fn ceiling(&self) -> u64;

    /// Whether `n` is prime.
    fn is_prime(&self, n: u64) -> Result<bool, SieveError>;

    /// Number of primes strictly below `max`.
    fn count(&self, max: u64) -> Result<u32, SieveError>;

    /// The `n`-th prime, 0-indexed.
    fn nth(&self, n: u64) -> Result<u64, SieveError>;

    /// Ascending primes strictly below `max`.
    fn enumerate(&self, max: u64) -> Result<Self::Primes<'_>, SieveError>;
}

impl PrimeTable for Sieve {
    type Primes<'a> = Primes<'a>;

    fn ceiling(&self) -> u64 {
        Sieve::ceiling(self)
    }

    fn is_prime(&self, n: u64) -> Result<bool, SieveError> {
        Sieve::is_prime(self, n)
    }

    fn count(&self, max: u64) -> Result<u32, SieveError> {
        Sieve::count(self, max)
    }

    fn nth(&self, n: u64) -> Result<u64, SieveError> {
        Sieve::nth(self, n)
    }

    fn enumerate(&self, max: u64) -> Result<Primes<'_>, SieveError> {
        Sieve::enumerate(self, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SieveConfig;

    fn smallest_factor<T: PrimeTable>(table: &T, n: u64) -> Result<Option<u64>, SieveError> {
        for p in table.enumerate(table.ceiling())? {
            let p = u64::from(p?);
            if p * p > n {
                break;
            }
            if n % p == 0 {
                return Ok(Some(p));
            }
        }
        Ok(None)
    }

    #[test]
    fn generic_caller_through_trait() {
        let sieve = Sieve::new(SieveConfig::with_ceiling(1 << 12, 1 << 10)).unwrap();
        assert_eq!(smallest_factor(&sieve, 91).unwrap(), Some(7));
        assert_eq!(smallest_factor(&sieve, 97).unwrap(), None);
        assert_eq!(PrimeTable::nth(&sieve, 0).unwrap(), 2);
        assert_eq!(PrimeTable::count(&sieve, 30).unwrap(), 10);
    }
}

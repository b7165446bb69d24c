//! Small-ceiling sieve configurations and a reference [`PrimeTable`].

use tamis_buffer::PoolConfig;
use tamis_sieve::{Backing, PrimeTable, SieveConfig, SieveError};

use crate::{is_prime_trial, primes_below};

/// A config with the given ceiling and segment size and a fixed worker
/// count, so partitioning is deterministic across machines.
pub fn small_config(ceiling: u64, segment_size: u64) -> SieveConfig {
    SieveConfig {
        worker_count: Some(4),
        ..SieveConfig::with_ceiling(ceiling, segment_size)
    }
}

/// [`small_config`] backed by buffer pools with a small minimum block.
pub fn pooled_config(ceiling: u64, segment_size: u64) -> SieveConfig {
    SieveConfig {
        backing: Backing::Pooled(PoolConfig {
            min_block_len: 64,
            ..PoolConfig::default()
        }),
        ..small_config(ceiling, segment_size)
    }
}

/// A [`PrimeTable`] answering from a precomputed prime list.
#[derive(Clone, Debug)]
pub struct ReferenceTable {
    ceiling: u64,
    primes: Vec<u32>,
}

impl ReferenceTable {
    pub fn new(ceiling: u64) -> Self {
        Self {
            ceiling,
            primes: primes_below(ceiling),
        }
    }

    pub fn primes(&self) -> &[u32] {
        &self.primes
    }

    fn check_max(&self, max: u64) -> Result<(), SieveError> {
        if max > self.ceiling {
            return Err(SieveError::InvalidArgument {
                reason: format!("max {max} exceeds the ceiling {}", self.ceiling),
            });
        }
        Ok(())
    }
}

impl PrimeTable for ReferenceTable {
    type Primes<'a> = std::vec::IntoIter<Result<u32, SieveError>>;

    fn ceiling(&self) -> u64 {
        self.ceiling
    }

    fn is_prime(&self, n: u64) -> Result<bool, SieveError> {
        Ok(is_prime_trial(n))
    }

    fn count(&self, max: u64) -> Result<u32, SieveError> {
        self.check_max(max)?;
        Ok(self.primes.partition_point(|&p| u64::from(p) < max) as u32)
    }

    fn nth(&self, n: u64) -> Result<u64, SieveError> {
        if n >= self.ceiling {
            return Err(SieveError::InvalidArgument {
                reason: format!("index {n} is not below the ceiling {}", self.ceiling),
            });
        }
        self.primes
            .get(n as usize)
            .map(|&p| u64::from(p))
            .ok_or(SieveError::OutOfRange {
                index: n,
                available: self.primes.len() as u64,
            })
    }

    fn enumerate(&self, max: u64) -> Result<Self::Primes<'_>, SieveError> {
        self.check_max(max)?;
        Ok(self
            .primes
            .iter()
            .take_while(|&&p| u64::from(p) < max)
            .map(|&p| Ok(p))
            .collect::<Vec<_>>()
            .into_iter())
    }
}

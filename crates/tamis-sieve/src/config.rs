//! Sieve configuration, validation, and error types.
//!
//! [`SieveConfig`] is the input to [`Sieve::new()`](crate::Sieve::new).
//! [`validate()`](SieveConfig::validate) checks the structural invariants
//! the wheel, seed, and segment code rely on: power-of-two ceiling and
//! segment size, whole-word segments, and a ceiling within the 32-bit range.

use std::error::Error;
use std::fmt;

use tamis_buffer::{PoolConfig, PoolConfigError};

// ── InitPolicy ─────────────────────────────────────────────────────

/// What a caller does when it finds initialisation already in flight on
/// another thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitPolicy {
    /// Return [`SieveError::ConcurrentInitialization`](crate::SieveError::ConcurrentInitialization)
    /// immediately. The losing caller may retry once the winner finishes.
    #[default]
    FailFast,
    /// Block until the winning thread finishes (or fails) initialisation.
    Wait,
}

// ── Backing ────────────────────────────────────────────────────────

/// Which buffer provider backs the bit table and seed buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Backing {
    /// Memory straight from the global allocator.
    #[default]
    Direct,
    /// Blocks leased from sieve-owned pools built with this configuration.
    Pooled(PoolConfig),
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`SieveConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The ceiling is not a power of two within `[MIN_CEILING, MAX_CEILING]`.
    InvalidCeiling {
        /// The configured ceiling.
        value: u64,
    },
    /// The segment size is not a power of two of at least `MIN_SEGMENT_SIZE`.
    InvalidSegmentSize {
        /// The configured segment size.
        value: u64,
    },
    /// The segment size is larger than the ceiling.
    SegmentExceedsCeiling {
        /// The configured segment size.
        segment_size: u64,
        /// The configured ceiling.
        ceiling: u64,
    },
    /// `worker_count` was explicitly set to zero.
    ZeroWorkers,
    /// The pool configuration for [`Backing::Pooled`] is invalid.
    Pool(PoolConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCeiling { value } => write!(
                f,
                "ceiling must be a power of two in [{}, {}], got {value}",
                SieveConfig::MIN_CEILING,
                SieveConfig::MAX_CEILING
            ),
            Self::InvalidSegmentSize { value } => write!(
                f,
                "segment_size must be a power of two of at least {}, got {value}",
                SieveConfig::MIN_SEGMENT_SIZE
            ),
            Self::SegmentExceedsCeiling {
                segment_size,
                ceiling,
            } => write!(f, "segment_size {segment_size} exceeds ceiling {ceiling}"),
            Self::ZeroWorkers => write!(f, "worker_count must be at least 1"),
            Self::Pool(e) => write!(f, "pool: {e}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PoolConfigError> for ConfigError {
    fn from(e: PoolConfigError) -> Self {
        Self::Pool(e)
    }
}

// ── SieveConfig ────────────────────────────────────────────────────

/// Configuration for a [`Sieve`](crate::Sieve).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SieveConfig {
    /// Exclusive upper bound of the bit table.
    ///
    /// Default: 2^32 (a 512 MiB table). Must be a power of two in
    /// `[MIN_CEILING, MAX_CEILING]`.
    pub ceiling: u64,

    /// Size of one extension segment, in integers.
    ///
    /// Default: 2^22. Must be a power of two, at least `MIN_SEGMENT_SIZE`,
    /// and no larger than `ceiling`.
    pub segment_size: u64,

    /// Number of worker partitions per segment. `None` = auto-detect
    /// (`available_parallelism`, clamped to `[1, 64]`).
    pub worker_count: Option<usize>,

    /// Behaviour of a caller that loses the initialisation race.
    pub init_policy: InitPolicy,

    /// Buffer provider for the table and seeds.
    pub backing: Backing,
}

impl SieveConfig {
    /// Default ceiling: the full 32-bit range.
    pub const DEFAULT_CEILING: u64 = 1 << 32;

    /// Default segment size: 4M integers (128K words).
    pub const DEFAULT_SEGMENT_SIZE: u64 = 1 << 22;

    /// Smallest accepted ceiling.
    pub const MIN_CEILING: u64 = 1 << 10;

    /// Largest accepted ceiling; enumeration yields `u32` values.
    pub const MAX_CEILING: u64 = 1 << 32;

    /// Smallest accepted segment size (32 words).
    pub const MIN_SEGMENT_SIZE: u64 = 1 << 10;

    /// Upper clamp for worker partitions.
    pub const MAX_WORKERS: usize = 64;

    /// Config with the given ceiling and segment size, defaults elsewhere.
    pub fn with_ceiling(ceiling: u64, segment_size: u64) -> Self {
        Self {
            ceiling,
            segment_size,
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ceiling.is_power_of_two()
            || self.ceiling < Self::MIN_CEILING
            || self.ceiling > Self::MAX_CEILING
        {
            return Err(ConfigError::InvalidCeiling {
                value: self.ceiling,
            });
        }
        if !self.segment_size.is_power_of_two() || self.segment_size < Self::MIN_SEGMENT_SIZE {
            return Err(ConfigError::InvalidSegmentSize {
                value: self.segment_size,
            });
        }
        if self.segment_size > self.ceiling {
            return Err(ConfigError::SegmentExceedsCeiling {
                segment_size: self.segment_size,
                ceiling: self.ceiling,
            });
        }
        if self.worker_count == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        if let Backing::Pooled(pool) = &self.backing {
            pool.validate()?;
        }
        Ok(())
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, Self::MAX_WORKERS),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, Self::MAX_WORKERS),
        }
    }

    /// Exclusive bound on seed primes: every prime `p` with `p² < ceiling`
    /// is below it.
    pub fn seed_limit(&self) -> u64 {
        (self.ceiling - 1).isqrt() + 1
    }

    /// Number of 32-bit words in the bit table.
    pub fn table_words(&self) -> usize {
        (self.ceiling / 32) as usize
    }

    /// Size of the bit table in bytes.
    pub fn table_bytes(&self) -> usize {
        self.table_words() * std::mem::size_of::<u32>()
    }

    /// Number of segments covering the table.
    pub fn segment_count(&self) -> u64 {
        self.ceiling / self.segment_size
    }
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            ceiling: Self::DEFAULT_CEILING,
            segment_size: Self::DEFAULT_SEGMENT_SIZE,
            worker_count: None,
            init_policy: InitPolicy::default(),
            backing: Backing::default(),
        }
    }
}

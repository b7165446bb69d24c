//! Pool configuration parameters.

use std::error::Error;
use std::fmt;

/// Configuration for a [`BufferPool`](crate::BufferPool).
///
/// Controls block size classes and how many returned blocks are kept for
/// reuse. Validated by [`validate()`](Self::validate); all values are
/// immutable once the pool is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Smallest block length handed out, in elements.
    ///
    /// Default: 16. Must be a power of two.
    pub min_block_len: usize,

    /// Maximum number of idle blocks retained per size class.
    ///
    /// Default: 8. Blocks returned while the class is full are freed.
    pub max_retained_per_class: usize,

    /// Largest request length (in elements) served from a size class.
    ///
    /// Default: 2^28. Larger requests receive an exact-size block that is
    /// freed on release instead of being retained.
    pub max_pooled_len: usize,
}

impl PoolConfig {
    /// Default minimum block length in elements.
    pub const DEFAULT_MIN_BLOCK_LEN: usize = 16;

    /// Default number of idle blocks per size class.
    pub const DEFAULT_MAX_RETAINED_PER_CLASS: usize = 8;

    /// Default largest pooled request, in elements.
    pub const DEFAULT_MAX_POOLED_LEN: usize = 1 << 28;

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), PoolConfigError> {
        if self.min_block_len == 0 || !self.min_block_len.is_power_of_two() {
            return Err(PoolConfigError::MinBlockLen {
                value: self.min_block_len,
            });
        }
        if self.max_retained_per_class == 0 {
            return Err(PoolConfigError::NoRetention);
        }
        if self.max_pooled_len < self.min_block_len {
            return Err(PoolConfigError::MaxPooledLen {
                value: self.max_pooled_len,
                min_block_len: self.min_block_len,
            });
        }
        Ok(())
    }

    /// Block length used for a request of `len` elements.
    ///
    /// Returns the smallest power of two that is at least `len` and at least
    /// `min_block_len`, or `None` when the request is not pooled.
    pub fn size_class(&self, len: usize) -> Option<usize> {
        if len > self.max_pooled_len {
            return None;
        }
        len.max(self.min_block_len).checked_next_power_of_two()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_block_len: Self::DEFAULT_MIN_BLOCK_LEN,
            max_retained_per_class: Self::DEFAULT_MAX_RETAINED_PER_CLASS,
            max_pooled_len: Self::DEFAULT_MAX_POOLED_LEN,
        }
    }
}

/// Errors detected by [`PoolConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PoolConfigError {
    /// `min_block_len` is zero or not a power of two.
    MinBlockLen {
        /// The configured value.
        value: usize,
    },
    /// `max_retained_per_class` is zero.
    NoRetention,
    /// `max_pooled_len` is below `min_block_len`.
    MaxPooledLen {
        /// The configured value.
        value: usize,
        /// The configured minimum block length.
        min_block_len: usize,
    },
}

impl fmt::Display for PoolConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinBlockLen { value } => {
                write!(f, "min_block_len must be a non-zero power of two, got {value}")
            }
            Self::NoRetention => write!(f, "max_retained_per_class must be at least 1"),
            Self::MaxPooledLen {
                value,
                min_block_len,
            } => write!(
                f,
                "max_pooled_len {value} is below min_block_len {min_block_len}"
            ),
        }
    }
}

impl Error for PoolConfigError {}

//! Query and initialisation errors.

use std::error::Error;
use std::fmt;

use tamis_buffer::BufferError;

/// Errors surfaced by [`Sieve`](crate::Sieve) operations.
///
/// Every failure is reported synchronously to the caller; nothing is
/// retried internally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SieveError {
    /// An argument exceeds the representable range.
    InvalidArgument {
        /// Human-readable description of what's wrong.
        reason: String,
    },
    /// `nth(index)` asked for a prime past the end of the table.
    OutOfRange {
        /// The requested 0-based index.
        index: u64,
        /// Number of primes below the ceiling.
        available: u64,
    },
    /// Another thread is generating the table and the configured
    /// [`InitPolicy`](crate::InitPolicy) is `FailFast`.
    ConcurrentInitialization,
    /// `is_prime(value)` needs divisors at or above the ceiling.
    BeyondTrialDivision {
        /// The queried value.
        value: u64,
        /// The table ceiling.
        ceiling: u64,
    },
    /// The sieve was released and holds no table.
    Released,
    /// Buffer allocation or access failed.
    Buffer(BufferError),
}

impl fmt::Display for SieveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::OutOfRange { index, available } => write!(
                f,
                "prime index {index} out of range ({available} primes available)"
            ),
            Self::ConcurrentInitialization => {
                write!(f, "sieve initialisation already in progress on another thread")
            }
            Self::BeyondTrialDivision { value, ceiling } => write!(
                f,
                "cannot decide primality of {value}: its square root is not below the ceiling {ceiling}"
            ),
            Self::Released => write!(f, "sieve has been released"),
            Self::Buffer(e) => write!(f, "buffer: {e}"),
        }
    }
}

impl Error for SieveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Buffer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BufferError> for SieveError {
    fn from(e: BufferError) -> Self {
        Self::Buffer(e)
    }
}

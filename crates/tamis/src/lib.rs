//! Tamis: a lazily extended, wheel-accelerated segmented prime sieve.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the tamis sub-crates. For most users, adding `tamis` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tamis::prelude::*;
//!
//! // A 2^16 table sieved in 4K-integer segments.
//! let sieve = Sieve::new(SieveConfig::with_ceiling(1 << 16, 1 << 12)).unwrap();
//!
//! assert_eq!(sieve.count(100).unwrap(), 25);
//! assert_eq!(sieve.nth(24).unwrap(), 97);
//! let small: Vec<u32> = sieve.enumerate(20).unwrap().map(Result::unwrap).collect();
//! assert_eq!(small, [2, 3, 5, 7, 11, 13, 17, 19]);
//! assert!(sieve.is_prime(97).unwrap());
//! assert!(!sieve.is_prime(100).unwrap());
//!
//! // Queries extend the table one segment at a time.
//! assert!(sieve.state().is_ready());
//! assert!(sieve.boundary() < sieve.ceiling());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`buffer`] | `tamis-buffer` | `Buffer` contract, raw and pooled buffers, allocator, bulk copy |
//! | [`sieve`] | `tamis-sieve` | `Sieve` engine, configuration, errors, `PrimeTable` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Fixed-size buffers and their providers (`tamis-buffer`).
///
/// [`buffer::BufferAllocator`] hands out [`buffer::RawBuffer`]s or
/// [`buffer::PooledBuffer`]s behind the [`buffer::Buffer`] trait.
pub use tamis_buffer as buffer;

/// The sieve engine (`tamis-sieve`).
///
/// [`sieve::Sieve`] answers membership, counting, indexing and enumeration
/// queries; [`sieve::PrimeTable`] is the trait generic callers consume.
pub use tamis_sieve as sieve;

/// Common imports for typical tamis usage.
///
/// ```rust
/// use tamis::prelude::*;
/// ```
pub mod prelude {
    // Engine
    pub use tamis_sieve::{GenerationState, PrimeTable, Primes, Sieve, SieveMetrics};

    // Configuration
    pub use tamis_sieve::{Backing, InitPolicy, SieveConfig};
    pub use tamis_buffer::PoolConfig;

    // Errors
    pub use tamis_buffer::BufferError;
    pub use tamis_sieve::{ConfigError, SieveError};
}

//! Wheel-accelerated, segmented Sieve of Eratosthenes over the 32-bit range.
//!
//! A [`Sieve`] owns one packed bit table (one bit per integer below the
//! ceiling, 512 MiB for the default 2^32) and, while it is being built, a
//! buffer of seed primes. Nothing is allocated until the first query. The
//! first query pre-marks multiples of 2..13 with a replicated wheel pattern
//! and derives the seeds. Later queries extend the exact region one segment
//! at a time, splitting each segment across scoped worker threads that own
//! disjoint word ranges.
//!
//! ```text
//! bit table  [ word 0 | wheel pattern ──────────────────────────── ]
//!            [ exact ───────────▶ boundary | wheel only ─▶ ceiling ]
//! ```
//!
//! # Example
//!
//! ```
//! use tamis_sieve::{Sieve, SieveConfig};
//!
//! let sieve = Sieve::new(SieveConfig::with_ceiling(1 << 16, 1 << 12)).unwrap();
//! assert_eq!(sieve.count(100).unwrap(), 25);
//! assert_eq!(sieve.nth(24).unwrap(), 97);
//! assert!(sieve.is_prime(65_521).unwrap());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod bits;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod primes;
pub mod seed;
pub mod segment;
pub mod state;
pub mod traits;
pub mod wheel;

pub use config::{Backing, ConfigError, InitPolicy, SieveConfig};
pub use engine::Sieve;
pub use error::SieveError;
pub use metrics::SieveMetrics;
pub use primes::Primes;
pub use seed::SeedPrime;
pub use state::GenerationState;
pub use traits::PrimeTable;

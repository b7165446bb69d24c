//! Progress counters for a [`Sieve`](crate::Sieve).
//!
//! [`SieveMetrics`] is a point-in-time snapshot taken by
//! [`Sieve::metrics()`](crate::Sieve::metrics).

use crate::state::GenerationState;

/// Snapshot of a sieve's generation progress and footprint.
///
/// Counters are cumulative over the sieve's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SieveMetrics {
    /// Generation state at snapshot time.
    pub state: GenerationState,
    /// Integer up to which the table is exact.
    pub boundary: u64,
    /// Exclusive upper bound of the table.
    pub ceiling: u64,
    /// Segments crossed off so far.
    pub segments_sieved: u64,
    /// Extension calls that sieved at least one segment.
    pub extensions: u64,
    /// Completed table builds (0 or 1).
    pub initializations: u64,
    /// Number of seed primes produced by initialisation.
    pub seed_count: u64,
    /// Worker partitions per segment.
    pub workers: usize,
    /// Physical size of the bit table, in bytes. Zero before the first
    /// query and after release.
    pub table_bytes: usize,
}

impl SieveMetrics {
    /// Fraction of the table that is exact, in `[0.0, 1.0]`.
    pub fn progress(&self) -> f64 {
        self.boundary as f64 / self.ceiling as f64
    }
}

//! Wheel pre-sieve for the primes 2 through 13.
//!
//! The composite pattern of the wheel primes repeats every
//! `2·3·5·7·11·13 = 30030` integers. Its period in 32-bit words is the
//! smallest `w` with `32·w` a multiple of 30030, i.e. 15015 words. One period
//! is computed from per-prime cyclic masks, then replicated across the table
//! by doubling block copies and finally tiled in fixed chunks.

use tamis_buffer::{BufferAllocator, BufferError};

use crate::bits::SMALL_PRIMES_WORD;

/// Primes folded into the wheel pattern.
pub const WHEEL_PRIMES: [u32; 6] = [2, 3, 5, 7, 11, 13];

/// Length of one wheel period in words.
pub const WHEEL_PERIOD_WORDS: usize = 15_015;

/// Doubling stops before a chunk would exceed 8 MiB of words.
pub const MAX_CHUNK_WORDS: usize = (8 << 20) / std::mem::size_of::<u32>();

/// Per-word composite masks for one prime.
///
/// For odd `p` the multiples land on a different bit offset in each of `p`
/// consecutive words before the cycle repeats. For 2 every word is the same.
#[derive(Clone, Debug)]
pub struct CyclicMask {
    masks: Vec<u32>,
    next: usize,
}

impl CyclicMask {
    /// Generator for `prime`, positioned at word 0.
    pub fn new(prime: u32) -> Self {
        let period = if prime == 2 { 1 } else { prime as usize };
        let masks = (0..period as u64)
            .map(|word| {
                let base = word * 32;
                (0..32u64)
                    .filter(|bit| (base + bit) % u64::from(prime) == 0)
                    .fold(0u32, |mask, bit| mask | (1 << bit))
            })
            .collect();
        Self { masks, next: 0 }
    }

    /// Composite bits of the current word; advances to the next word.
    pub fn next_mask(&mut self) -> u32 {
        let mask = self.masks[self.next];
        self.next = (self.next + 1) % self.masks.len();
        mask
    }
}

/// Write the wheel pattern into `words`, starting at integer 0.
pub fn write_pattern(words: &mut [u32]) {
    let mut generators: Vec<CyclicMask> =
        WHEEL_PRIMES.iter().map(|&p| CyclicMask::new(p)).collect();
    for word in words.iter_mut() {
        let composite = generators
            .iter_mut()
            .fold(0u32, |acc, mask| acc | mask.next_mask());
        *word = !composite;
    }
}

/// Fill the whole table with the wheel pattern and store the word-0
/// constant.
///
/// Every copy moves a prefix `[0, n)` that is a whole number of periods to
/// a destination offset that is itself a multiple of the period.
pub fn fill(table: &mut [u32]) -> Result<(), BufferError> {
    let len = table.len();
    if len == 0 {
        return Ok(());
    }
    let period = WHEEL_PERIOD_WORDS.min(len);
    write_pattern(&mut table[..period]);

    // Doubling: [0, unit) always holds whole periods.
    let mut unit = period;
    while unit < len && unit * 2 <= MAX_CHUNK_WORDS {
        let n = unit.min(len - unit);
        let (done, rest) = table.split_at_mut(unit);
        BufferAllocator::copy(done, rest, n)?;
        unit += n;
    }

    // Tiling with the fixed chunk.
    let mut filled = unit;
    while filled < len {
        let n = unit.min(len - filled);
        let (done, rest) = table.split_at_mut(filled);
        BufferAllocator::copy(&done[..n], rest, n)?;
        filled += n;
    }

    table[0] = SMALL_PRIMES_WORD;
    Ok(())
}

//! Segment extension: disjoint word-aligned partitions crossed off by
//! scoped worker threads.
//!
//! Each worker owns a `&mut [u32]` sub-slice of the segment. The partitions
//! never share a word, so plain (non-atomic) clears are sound.

use std::ops::Range;

use smallvec::SmallVec;

use crate::bits;
use crate::seed::SeedPrime;

/// Partition list; inline for typical core counts.
pub type Partitions = SmallVec<[Range<u64>; 16]>;

/// Split `range` into at most `workers` contiguous, word-aligned,
/// non-overlapping pieces covering it exactly.
pub fn partition(range: Range<u64>, workers: usize) -> Partitions {
    debug_assert_eq!(range.start % bits::WORD_BITS, 0);
    debug_assert_eq!(range.end % bits::WORD_BITS, 0);
    let total_words = (range.end - range.start) / bits::WORD_BITS;
    let parts = (workers as u64).clamp(1, total_words.max(1));
    let step = total_words.div_ceil(parts) * bits::WORD_BITS;

    let mut out = Partitions::new();
    let mut start = range.start;
    while start < range.end {
        let end = (start + step).min(range.end);
        out.push(start..end);
        start = end;
    }
    out
}

/// Smallest odd multiple of odd `p` that is `>= from`.
#[inline]
pub fn first_odd_multiple(p: u64, from: u64) -> u64 {
    let mut k = from.div_ceil(p);
    if k % 2 == 0 {
        k += 1;
    }
    k * p
}

/// Clear the odd multiples of every seed inside `range`.
///
/// `words[0]` holds integers `range.start..range.start + 32`. Seeds are
/// scanned in ascending order and the scan stops at the first `p` with
/// `p² >= range.end`.
pub fn cross_off(words: &mut [u32], range: Range<u64>, seeds: &[SeedPrime]) {
    for seed in seeds {
        let p = u64::from(seed.prime);
        if p * p >= range.end {
            break;
        }
        let mut n = first_odd_multiple(p, range.start).max(u64::from(seed.cursor));
        while n < range.end {
            bits::clear(words, n - range.start);
            n += 2 * p;
        }
    }
}

/// Sieve one segment, `words` being exactly the words of `range`.
///
/// Returns the number of partitions used.
pub fn sieve_segment(
    words: &mut [u32],
    range: Range<u64>,
    seeds: &[SeedPrime],
    workers: usize,
) -> usize {
    let parts = partition(range.clone(), workers);
    if parts.len() == 1 {
        cross_off(words, range, seeds);
        return 1;
    }

    std::thread::scope(|scope| {
        let mut rest = words;
        for part in &parts {
            let len = ((part.end - part.start) / bits::WORD_BITS) as usize;
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(len);
            rest = tail;
            let part = part.clone();
            scope.spawn(move || cross_off(chunk, part, seeds));
        }
    });
    parts.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{seed, wheel};

    fn is_prime_naive(n: u64) -> bool {
        n >= 2 && (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    fn seeded(ceiling: u64) -> (Vec<u32>, Vec<SeedPrime>) {
        let mut table = vec![0u32; (ceiling / 32) as usize];
        wheel::fill(&mut table).unwrap();
        let limit = (ceiling - 1).isqrt() + 1;
        let count = seed::sieve_seed_range(&mut table, limit);
        let mut seeds = vec![SeedPrime::default(); count];
        seed::write_seeds(&table, limit, &mut seeds);
        (table, seeds)
    }

    #[test]
    fn partition_is_disjoint_and_covering() {
        let parts = partition(4096..8192, 3);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0].start, 4096);
        assert_eq!(parts.last().unwrap().end, 8192);
        for pair in parts.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert!(parts.iter().all(|r| r.start % 32 == 0 && r.end % 32 == 0));
    }

    #[test]
    fn partition_never_splits_a_word() {
        let parts = partition(0..64, 8);
        assert_eq!(parts.as_slice(), &[0..32, 32..64]);
    }

    #[test]
    fn first_odd_multiple_cases() {
        assert_eq!(first_odd_multiple(17, 0), 17);
        assert_eq!(first_odd_multiple(17, 18), 51);
        assert_eq!(first_odd_multiple(17, 51), 51);
        assert_eq!(first_odd_multiple(19, 1024), 1045);
    }

    #[test]
    fn multi_worker_segment_matches_reference() {
        let ceiling = 1 << 16;
        let (mut table, seeds) = seeded(ceiling);
        let used = sieve_segment(&mut table, 0..ceiling, &seeds, 5);
        assert_eq!(used, 5);
        for n in 0..ceiling {
            assert_eq!(bits::test(&table, n), is_prime_naive(n), "n={n}");
        }
    }

    #[test]
    fn segments_sieved_independently() {
        let ceiling = 1 << 14;
        let (mut table, seeds) = seeded(ceiling);
        let seg = 1 << 12;
        for start in (0..ceiling).step_by(seg as usize) {
            let words = &mut table[(start / 32) as usize..((start + seg) / 32) as usize];
            sieve_segment(words, start..start + seg, &seeds, 2);
        }
        for n in 0..ceiling {
            assert_eq!(bits::test(&table, n), is_prime_naive(n), "n={n}");
        }
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn partition_covers_any_segment(start_word in 0u64..1_000, words in 1u64..5_000, workers in 1usize..80) {
                let range = start_word * 32..(start_word + words) * 32;
                let parts = partition(range.clone(), workers);
                prop_assert!(parts.len() <= workers);
                prop_assert_eq!(parts[0].start, range.start);
                prop_assert_eq!(parts.last().unwrap().end, range.end);
                for pair in parts.windows(2) {
                    prop_assert_eq!(pair[0].end, pair[1].start);
                }
            }
        }
    }
}

//! Bit addressing over the packed `u32` table.
//!
//! Integer `n` lives in word `n >> 5`, bit `n & 31`. A set bit means "still
//! a candidate prime".

/// Bits per table word.
pub const WORD_BITS: u64 = 32;

/// Exact primality of 0..31: bits 2, 3, 5, 7, 11, 13, 17, 19, 23, 29 and 31.
pub const SMALL_PRIMES_WORD: u32 = 0xA08A_28AC;

/// Mask of the odd offsets within a word.
pub const ODD_BITS: u32 = 0xAAAA_AAAA;

/// Whether bit `n` is set.
#[inline]
pub fn test(words: &[u32], n: u64) -> bool {
    words[(n >> 5) as usize] & (1 << (n & 31)) != 0
}

/// Clear bit `n`.
#[inline]
pub fn clear(words: &mut [u32], n: u64) {
    words[(n >> 5) as usize] &= !(1 << (n & 31));
}

/// Number of set bits strictly below `max`.
///
/// Whole words are popcounted; the partial final word is masked first.
pub fn count_below(words: &[u32], max: u64) -> u64 {
    let whole = (max / WORD_BITS) as usize;
    let mut total: u64 = words[..whole].iter().map(|w| u64::from(w.count_ones())).sum();
    let rem = max % WORD_BITS;
    if rem != 0 {
        let mask = (1u32 << rem) - 1;
        total += u64::from((words[whole] & mask).count_ones());
    }
    total
}

/// Offset of the `k`-th set bit (0-based) of `word`.
///
/// `k` must be below `word.count_ones()`.
#[inline]
pub fn select(mut word: u32, k: u32) -> u32 {
    debug_assert!(k < word.count_ones());
    for _ in 0..k {
        word &= word - 1;
    }
    word.trailing_zeros()
}

//! The lazy prime sequence returned by [`Sieve::enumerate`].

use std::iter::FusedIterator;

use crate::bits::{self, ODD_BITS};
use crate::engine::Sieve;
use crate::error::SieveError;

/// Words copied out of the table per lock acquisition.
const WINDOW_WORDS: usize = 1024;

/// Ascending primes below a fixed `max`.
///
/// # Side effects
///
/// This is not a pure view of the table. When the scan reaches the sieve's
/// current boundary, pulling the next item extends the shared table, which
/// may block on an extension already in flight on another thread and then
/// runs segments on the calling thread. A pull extends the table no further
/// than the end of the segment holding the next 1024-word window; with
/// segments of at least 1024 words that is at most one segment.
///
/// The table lock is held only while a window is copied, never between
/// pulls. Each call to [`Sieve::enumerate`] starts a fresh scan from 2.
///
/// An `Err` item is final; the sequence is fused after it.
pub struct Primes<'a> {
    sieve: &'a Sieve,
    max: u64,
    started: bool,
    done: bool,
    window: Vec<u32>,
    window_start: usize,
    position: usize,
    pending: u32,
    pending_base: u64,
}

impl<'a> Primes<'a> {
    pub(crate) fn new(sieve: &'a Sieve, max: u64) -> Self {
        Self {
            sieve,
            max,
            started: false,
            done: false,
            window: Vec::with_capacity(WINDOW_WORDS),
            window_start: 0,
            position: 0,
            pending: 0,
            pending_base: 0,
        }
    }

    /// Exclusive upper bound of this sequence.
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Copy the next window of words, extending the table to cover it.
    fn load_window(&mut self, first_word: usize) -> Result<(), SieveError> {
        let max_word = self.max.div_ceil(bits::WORD_BITS) as usize;
        let last_word = (first_word + WINDOW_WORDS).min(max_word);
        self.sieve.advance(last_word as u64 * bits::WORD_BITS)?;
        let window = &mut self.window;
        self.sieve.with_table(|words| {
            window.clear();
            window.extend_from_slice(&words[first_word..last_word]);
        })?;
        self.window_start = first_word;
        self.position = 0;
        Ok(())
    }
}

impl Iterator for Primes<'_> {
    type Item = Result<u32, SieveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            if self.max > 2 {
                return Some(Ok(2));
            }
            self.done = true;
            return None;
        }
        loop {
            if self.pending != 0 {
                let bit = self.pending.trailing_zeros();
                self.pending &= self.pending - 1;
                let n = self.pending_base + u64::from(bit);
                if n >= self.max {
                    self.done = true;
                    return None;
                }
                return Some(Ok(n as u32));
            }
            if self.position < self.window.len() {
                self.pending = self.window[self.position] & ODD_BITS;
                self.pending_base = (self.window_start + self.position) as u64 * bits::WORD_BITS;
                self.position += 1;
                continue;
            }
            let next_word = self.window_start + self.window.len();
            if next_word as u64 * bits::WORD_BITS >= self.max {
                self.done = true;
                return None;
            }
            if let Err(e) = self.load_window(next_word) {
                self.done = true;
                return Some(Err(e));
            }
        }
    }
}

impl FusedIterator for Primes<'_> {}

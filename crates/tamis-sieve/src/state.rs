//! Generation state machine.
//!
//! ```text
//! NotStarted ──CAS──▶ Generating ──▶ PartiallyGenerated ──▶ FullyGenerated
//!      ▲                  │
//!      └──── on failure ──┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// How far the bit table has been built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GenerationState {
    /// No table yet.
    NotStarted = 0,
    /// One thread is running the wheel and seed construction.
    Generating = 1,
    /// Seeds exist; the boundary is below the ceiling.
    PartiallyGenerated = 2,
    /// The boundary equals the ceiling and the seeds are released.
    FullyGenerated = 3,
}

impl GenerationState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::NotStarted,
            1 => Self::Generating,
            2 => Self::PartiallyGenerated,
            _ => Self::FullyGenerated,
        }
    }

    /// Whether queries can read the table.
    pub fn is_ready(self) -> bool {
        matches!(self, Self::PartiallyGenerated | Self::FullyGenerated)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Generating => "generating",
            Self::PartiallyGenerated => "partially generated",
            Self::FullyGenerated => "fully generated",
        };
        f.write_str(name)
    }
}

/// Atomic cell holding a [`GenerationState`].
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(GenerationState::NotStarted as u8))
    }

    pub fn load(&self) -> GenerationState {
        GenerationState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: GenerationState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Claim the `NotStarted → Generating` transition.
    ///
    /// Exactly one caller wins; the others get the state they observed.
    pub fn try_begin(&self) -> Result<(), GenerationState> {
        self.0
            .compare_exchange(
                GenerationState::NotStarted as u8,
                GenerationState::Generating as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(GenerationState::from_u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn begin_succeeds_once() {
        let cell = StateCell::new();
        assert_eq!(cell.try_begin(), Ok(()));
        assert_eq!(cell.try_begin(), Err(GenerationState::Generating));
        cell.store(GenerationState::PartiallyGenerated);
        assert_eq!(cell.try_begin(), Err(GenerationState::PartiallyGenerated));
    }

    #[test]
    fn exactly_one_thread_wins_the_race() {
        let cell = Arc::new(StateCell::new());
        let wins = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                let wins = Arc::clone(&wins);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    if cell.try_begin().is_ok() {
                        wins.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::Relaxed), 1);
        assert_eq!(cell.load(), GenerationState::Generating);
    }

    #[test]
    fn ready_states() {
        assert!(!GenerationState::NotStarted.is_ready());
        assert!(!GenerationState::Generating.is_ready());
        assert!(GenerationState::PartiallyGenerated.is_ready());
        assert!(GenerationState::FullyGenerated.is_ready());
    }
}

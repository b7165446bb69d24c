//! The `Sieve` engine: lazy initialisation, segment extension, queries.
//!
//! # Architecture
//!
//! ```text
//! caller ──query──▶ ensure_initialized()
//!                     │  CAS NotStarted → Generating (one winner)
//!                     │  wheel::fill → seed::sieve_seed_range → write_seeds
//!                     │  state = PartiallyGenerated, advance(first segment)
//!                     ▼
//!                   advance(target)            [storage.write()]
//!                     │  per segment: partition → scoped workers → cross_off
//!                     │  boundary.store(end)
//!                     │  at ceiling: release seeds, state = FullyGenerated
//!                     ▼
//!                   read bits                  [storage.read()]
//! ```
//!
//! The boundary is an atomic so queries below it skip the write lock
//! entirely. Extenders re-check it after acquiring the write lock and
//! return without redoing work when another thread got there first.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Condvar, Mutex, RwLock};
use tamis_buffer::{Buffer, BufferAllocator, BufferPool, Fill};

use crate::bits;
use crate::config::{Backing, ConfigError, InitPolicy, SieveConfig};
use crate::error::SieveError;
use crate::metrics::SieveMetrics;
use crate::primes::Primes;
use crate::seed::{self, SeedPrime};
use crate::segment;
use crate::state::{GenerationState, StateCell};
use crate::wheel;

/// Buffers owned by the engine.
pub(crate) struct Storage {
    table: Option<Box<dyn Buffer<u32>>>,
    seeds: Option<Box<dyn Buffer<SeedPrime>>>,
}

#[derive(Default)]
struct Counters {
    segments: AtomicU64,
    extensions: AtomicU64,
    initializations: AtomicU64,
    seed_count: AtomicU64,
}

/// A lazily generated prime bit table over `[0, ceiling)`.
///
/// Construct one with [`Sieve::new`] and share it with `Arc`; every query
/// takes `&self`. The table is built on first use and extended one segment
/// at a time as queries reach past the current boundary.
pub struct Sieve {
    config: SieveConfig,
    workers: usize,
    table_alloc: BufferAllocator<u32>,
    seed_alloc: BufferAllocator<SeedPrime>,
    state: StateCell,
    boundary: AtomicU64,
    storage: RwLock<Storage>,
    init_gate: Mutex<()>,
    init_done: Condvar,
    counters: Counters,
    released: bool,
}

impl Sieve {
    /// Validate `config` and build an engine. No memory is allocated until
    /// the first query.
    pub fn new(config: SieveConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (table_alloc, seed_alloc) = match &config.backing {
            Backing::Direct => (BufferAllocator::direct(), BufferAllocator::direct()),
            Backing::Pooled(pool) => (
                BufferAllocator::pooled(BufferPool::new(pool.clone())?),
                BufferAllocator::pooled(BufferPool::new(pool.clone())?),
            ),
        };
        Self::with_allocators(config, table_alloc, seed_alloc)
    }

    /// Build an engine drawing its buffers from caller-supplied allocators,
    /// e.g. pools shared between several sieves. `config.backing` is
    /// ignored.
    pub fn with_allocators(
        config: SieveConfig,
        table_alloc: BufferAllocator<u32>,
        seed_alloc: BufferAllocator<SeedPrime>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let workers = config.resolved_worker_count();
        Ok(Self {
            config,
            workers,
            table_alloc,
            seed_alloc,
            state: StateCell::new(),
            boundary: AtomicU64::new(0),
            storage: RwLock::new(Storage {
                table: None,
                seeds: None,
            }),
            init_gate: Mutex::new(()),
            init_done: Condvar::new(),
            counters: Counters::default(),
            released: false,
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &SieveConfig {
        &self.config
    }

    /// Exclusive upper bound of the table.
    pub fn ceiling(&self) -> u64 {
        self.config.ceiling
    }

    /// Current generation state.
    pub fn state(&self) -> GenerationState {
        self.state.load()
    }

    /// Integer up to which the table is exact.
    pub fn boundary(&self) -> u64 {
        self.boundary.load(Ordering::Acquire)
    }

    /// Snapshot of progress counters.
    pub fn metrics(&self) -> SieveMetrics {
        let table_bytes = self
            .storage
            .read()
            .table
            .as_ref()
            .map_or(0, |t| t.memory_bytes());
        SieveMetrics {
            state: self.state(),
            boundary: self.boundary(),
            ceiling: self.config.ceiling,
            segments_sieved: self.counters.segments.load(Ordering::Relaxed),
            extensions: self.counters.extensions.load(Ordering::Relaxed),
            initializations: self.counters.initializations.load(Ordering::Relaxed),
            seed_count: self.counters.seed_count.load(Ordering::Relaxed),
            workers: self.workers,
            table_bytes,
        }
    }

    // ── Initialisation ─────────────────────────────────────────────

    /// Build the wheel-seeded table and the seed primes if nobody has yet,
    /// then sieve the first segment.
    ///
    /// Exactly one thread performs the build. A thread that finds it in
    /// progress fails with [`SieveError::ConcurrentInitialization`] under
    /// [`InitPolicy::FailFast`] (the default) or blocks until it finishes
    /// under [`InitPolicy::Wait`]. Once the table exists this is a cheap
    /// no-op.
    pub fn ensure_initialized(&self) -> Result<(), SieveError> {
        if self.released {
            return Err(SieveError::Released);
        }
        loop {
            match self.state.try_begin() {
                Ok(()) => return self.initialize(),
                Err(state) if state.is_ready() => return Ok(()),
                Err(GenerationState::Generating) => match self.config.init_policy {
                    InitPolicy::FailFast => return Err(SieveError::ConcurrentInitialization),
                    InitPolicy::Wait => self.wait_for_initialization(),
                },
                // Lost a rollback race; try to claim it again.
                Err(_) => {}
            }
        }
    }

    fn wait_for_initialization(&self) {
        let mut gate = self.init_gate.lock();
        while self.state.load() == GenerationState::Generating {
            self.init_done.wait(&mut gate);
        }
    }

    fn initialize(&self) -> Result<(), SieveError> {
        let started = Instant::now();
        let built = self.build_table();
        {
            let _gate = self.init_gate.lock();
            match &built {
                Ok(_) => self.state.store(GenerationState::PartiallyGenerated),
                Err(e) => {
                    tracing::warn!(error = %e, "sieve initialisation failed, state rolled back");
                    self.state.store(GenerationState::NotStarted);
                }
            }
            self.init_done.notify_all();
        }
        let seeds = built?;
        self.counters.initializations.fetch_add(1, Ordering::Relaxed);
        self.counters.seed_count.store(seeds as u64, Ordering::Relaxed);
        tracing::info!(
            ceiling = self.config.ceiling,
            seeds,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sieve table initialised"
        );
        self.advance(self.config.segment_size)
    }

    /// Wheel fill and seed generation into fresh buffers, then publish them.
    fn build_table(&self) -> Result<usize, SieveError> {
        let mut table = self
            .table_alloc
            .allocate(self.config.table_words(), Fill::Unspecified)?;
        let limit = self.config.seed_limit();
        let (count, seeds) = {
            let words = table.as_mut_slice()?;
            wheel::fill(words)?;
            let count = seed::sieve_seed_range(words, limit);
            let mut seeds = self.seed_alloc.allocate(count, Fill::Zeroed)?;
            seed::write_seeds(words, limit, seeds.as_mut_slice()?);
            (count, seeds)
        };

        let mut storage = self.storage.write();
        storage.table = Some(table);
        storage.seeds = Some(seeds);
        self.boundary.store(0, Ordering::Release);
        Ok(count)
    }

    // ── Extension ──────────────────────────────────────────────────

    /// Make the table exact at least up to `target` (rounded up to a
    /// segment multiple, clamped to the ceiling).
    pub fn extend_to(&self, target: u64) -> Result<(), SieveError> {
        self.ensure_initialized()?;
        self.advance(target)
    }

    /// Sieve the whole table; afterwards the state is
    /// [`GenerationState::FullyGenerated`].
    pub fn generate_all(&self) -> Result<(), SieveError> {
        self.extend_to(self.config.ceiling)
    }

    fn segment_end(&self, target: u64) -> u64 {
        let seg = self.config.segment_size;
        target
            .div_ceil(seg)
            .saturating_mul(seg)
            .min(self.config.ceiling)
    }

    /// Extend without the initialisation check. Callers must have run
    /// [`ensure_initialized`](Self::ensure_initialized).
    pub(crate) fn advance(&self, target: u64) -> Result<(), SieveError> {
        let target = self.segment_end(target);
        if self.boundary() >= target {
            return Ok(());
        }

        let mut storage = self.storage.write();
        let from = self.boundary();
        if from >= target {
            return Ok(());
        }

        let seg = self.config.segment_size;
        let mut boundary = from;
        {
            let Storage { table, seeds } = &mut *storage;
            let words = table.as_mut().ok_or(SieveError::Released)?.as_mut_slice()?;
            let seeds = seeds.as_ref().ok_or(SieveError::Released)?.as_slice()?;
            while boundary < target {
                let end = boundary + seg;
                let slice = &mut words[(boundary / bits::WORD_BITS) as usize
                    ..(end / bits::WORD_BITS) as usize];
                let parts = segment::sieve_segment(slice, boundary..end, seeds, self.workers);
                tracing::trace!(start = boundary, end, parts, "segment sieved");
                boundary = end;
                self.boundary.store(boundary, Ordering::Release);
                self.counters.segments.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.counters.extensions.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            from,
            to = boundary,
            segments = (boundary - from) / seg,
            workers = self.workers,
            "sieve extended"
        );

        if boundary == self.config.ceiling {
            if let Some(mut seeds) = storage.seeds.take() {
                seeds.release();
            }
            self.state.store(GenerationState::FullyGenerated);
            tracing::info!(
                ceiling = self.config.ceiling,
                segments = self.counters.segments.load(Ordering::Relaxed),
                "sieve fully generated, seed buffer released"
            );
        }
        Ok(())
    }

    /// Run `f` over the whole table under the shared lock.
    pub(crate) fn with_table<R>(&self, f: impl FnOnce(&[u32]) -> R) -> Result<R, SieveError> {
        let storage = self.storage.read();
        let table = storage.table.as_ref().ok_or(SieveError::Released)?;
        Ok(f(table.as_slice()?))
    }

    fn check_max(&self, max: u64) -> Result<(), SieveError> {
        if max > self.config.ceiling {
            return Err(SieveError::InvalidArgument {
                reason: format!("max {max} exceeds the ceiling {}", self.config.ceiling),
            });
        }
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Whether `n` is prime.
    ///
    /// Values below the ceiling are read from the table, extending it to the
    /// segment holding `n` first if needed. Larger values are decided by
    /// trial division against the table primes up to `√n`; if `√n` itself
    /// reaches the ceiling the table cannot decide and
    /// [`SieveError::BeyondTrialDivision`] is returned.
    pub fn is_prime(&self, n: u64) -> Result<bool, SieveError> {
        self.ensure_initialized()?;
        if n < 2 {
            return Ok(false);
        }
        let ceiling = self.config.ceiling;
        if n < ceiling {
            self.advance(n + 1)?;
            return self.with_table(|words| bits::test(words, n));
        }

        let root = n.isqrt();
        if root >= ceiling {
            return Err(SieveError::BeyondTrialDivision { value: n, ceiling });
        }
        for p in self.enumerate(root + 1)? {
            if n % u64::from(p?) == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Number of primes strictly below `max`.
    ///
    /// `max` above the ceiling is [`SieveError::InvalidArgument`].
    pub fn count(&self, max: u64) -> Result<u32, SieveError> {
        self.check_max(max)?;
        self.ensure_initialized()?;
        if max < 2 {
            return Ok(0);
        }
        self.advance(max)?;
        // π(2^32) = 203,280,221 fits in u32.
        self.with_table(|words| bits::count_below(words, max) as u32)
    }

    /// The `n`-th prime, 0-indexed (`nth(0) == 2`).
    ///
    /// Walks the table one segment at a time, extending it as needed and
    /// accumulating per-word popcounts until the running total passes `n`.
    ///
    /// `n` at or above the ceiling can never name a table prime and is
    /// [`SieveError::InvalidArgument`], reported before anything is
    /// allocated. Smaller `n` past π(ceiling) is [`SieveError::OutOfRange`].
    pub fn nth(&self, n: u64) -> Result<u64, SieveError> {
        if n >= self.config.ceiling {
            return Err(SieveError::InvalidArgument {
                reason: format!("index {n} is not below the ceiling {}", self.config.ceiling),
            });
        }
        self.ensure_initialized()?;
        let ceiling = self.config.ceiling;
        let seg = self.config.segment_size;
        let mut seen = 0u64;
        let mut start = 0u64;
        while start < ceiling {
            let end = start + seg;
            self.advance(end)?;
            let found = self.with_table(|words| {
                let first = (start / bits::WORD_BITS) as usize;
                let mut total = seen;
                for (i, &word) in words[first..(end / bits::WORD_BITS) as usize]
                    .iter()
                    .enumerate()
                {
                    let ones = u64::from(word.count_ones());
                    if total + ones > n {
                        let bit = bits::select(word, (n - total) as u32);
                        return Ok(start + i as u64 * bits::WORD_BITS + u64::from(bit));
                    }
                    total += ones;
                }
                Err(total)
            })?;
            match found {
                Ok(prime) => return Ok(prime),
                Err(total) => seen = total,
            }
            start = end;
        }
        Err(SieveError::OutOfRange {
            index: n,
            available: seen,
        })
    }

    /// Lazy ascending sequence of the primes below `max`.
    ///
    /// See [`Primes`] for the extension side effect of drawing from it.
    pub fn enumerate(&self, max: u64) -> Result<Primes<'_>, SieveError> {
        self.check_max(max)?;
        self.ensure_initialized()?;
        Ok(Primes::new(self, max))
    }

    /// [`enumerate`](Self::enumerate) up to the ceiling.
    pub fn enumerate_all(&self) -> Result<Primes<'_>, SieveError> {
        self.enumerate(self.config.ceiling)
    }

    // ── Disposal ───────────────────────────────────────────────────

    /// Release the table and seed buffers. Later queries fail with
    /// [`SieveError::Released`]. Idempotent; also runs on drop.
    pub fn release(&mut self) {
        let storage = self.storage.get_mut();
        if let Some(mut table) = storage.table.take() {
            table.release();
        }
        if let Some(mut seeds) = storage.seeds.take() {
            seeds.release();
        }
        if !self.released {
            tracing::debug!(ceiling = self.config.ceiling, "sieve released");
        }
        self.released = true;
    }

    /// Whether [`release`](Self::release) has run.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for Sieve {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Sieve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sieve")
            .field("ceiling", &self.config.ceiling)
            .field("segment_size", &self.config.segment_size)
            .field("workers", &self.workers)
            .field("state", &self.state())
            .field("boundary", &self.boundary())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tamis_buffer::{BufferKind, PoolConfig};
    use tamis_test_utils::{is_prime_trial, primes_below};

    fn small(ceiling: u64, segment: u64) -> Sieve {
        Sieve::new(SieveConfig {
            worker_count: Some(3),
            ..SieveConfig::with_ceiling(ceiling, segment)
        })
        .unwrap()
    }

    #[test]
    fn new_allocates_nothing() {
        let sieve = small(1 << 16, 1 << 12);
        assert_eq!(sieve.state(), GenerationState::NotStarted);
        assert_eq!(sieve.metrics().table_bytes, 0);
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = Sieve::new(SieveConfig::with_ceiling(1000, 1 << 10)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidCeiling { value: 1000 });
    }

    #[test]
    fn initialisation_sieves_first_segment() {
        let sieve = small(1 << 16, 1 << 12);
        sieve.ensure_initialized().unwrap();
        assert_eq!(sieve.state(), GenerationState::PartiallyGenerated);
        assert_eq!(sieve.boundary(), 1 << 12);
        let m = sieve.metrics();
        assert_eq!(m.initializations, 1);
        assert_eq!(m.segments_sieved, 1);
        // Odd primes in [17, 256).
        assert_eq!(m.seed_count, 48);
        assert_eq!(m.table_bytes, (1 << 16) / 8);
    }

    #[test]
    fn extension_is_lazy_and_segment_aligned() {
        let sieve = small(1 << 16, 1 << 12);
        assert!(sieve.is_prime(5_003).unwrap());
        assert_eq!(sieve.boundary(), 2 << 12);
        sieve.extend_to(10_000).unwrap();
        assert_eq!(sieve.boundary(), 3 << 12);
        sieve.extend_to(u64::MAX).unwrap();
        assert_eq!(sieve.boundary(), 1 << 16);
        assert_eq!(sieve.state(), GenerationState::FullyGenerated);
    }

    #[test]
    fn whole_table_matches_trial_division() {
        let sieve = small(1 << 16, 1 << 12);
        for n in 0..1u64 << 16 {
            assert_eq!(sieve.is_prime(n).unwrap(), is_prime_trial(n), "n={n}");
        }
        assert_eq!(sieve.state(), GenerationState::FullyGenerated);
    }

    #[test]
    fn scenario_queries() {
        let sieve = small(1 << 12, 1 << 10);
        assert_eq!(sieve.count(100).unwrap(), 25);
        assert_eq!(sieve.nth(24).unwrap(), 97);
        let first: Vec<u32> = sieve.enumerate(20).unwrap().map(Result::unwrap).collect();
        assert_eq!(first, vec![2, 3, 5, 7, 11, 13, 17, 19]);
        assert!(sieve.is_prime(97).unwrap());
        assert!(!sieve.is_prime(100).unwrap());
    }

    #[test]
    fn count_edges() {
        let sieve = small(1 << 12, 1 << 10);
        assert_eq!(sieve.count(0).unwrap(), 0);
        assert_eq!(sieve.count(1).unwrap(), 0);
        assert_eq!(sieve.count(2).unwrap(), 0);
        assert_eq!(sieve.count(3).unwrap(), 1);
        assert_eq!(sieve.count(1 << 12).unwrap(), primes_below(1 << 12).len() as u32);
        assert!(matches!(
            sieve.count((1 << 12) + 1),
            Err(SieveError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn nth_matches_reference_and_reports_out_of_range() {
        let ceiling = 1 << 14;
        let sieve = small(ceiling, 1 << 11);
        let reference = primes_below(ceiling);
        for (i, &p) in reference.iter().enumerate() {
            assert_eq!(sieve.nth(i as u64).unwrap(), u64::from(p));
        }
        assert_eq!(
            sieve.nth(reference.len() as u64),
            Err(SieveError::OutOfRange {
                index: reference.len() as u64,
                available: reference.len() as u64,
            })
        );
    }

    #[test]
    fn nth_rejects_index_at_ceiling_without_generating() {
        let sieve = small(1 << 16, 1 << 12);
        for n in [1 << 16, 1 << 40, u64::MAX] {
            assert!(matches!(
                sieve.nth(n),
                Err(SieveError::InvalidArgument { .. })
            ));
        }
        assert_eq!(sieve.state(), GenerationState::NotStarted);
        assert_eq!(sieve.boundary(), 0);
        let m = sieve.metrics();
        assert_eq!(m.table_bytes, 0);
        assert_eq!(m.segments_sieved, 0);
    }

    #[test]
    fn trial_division_above_ceiling() {
        let sieve = small(1 << 10, 1 << 10);
        // 1021 is the largest prime below 1024; 1021² is decidable.
        assert!(sieve.is_prime(1031).unwrap());
        assert!(!sieve.is_prime(1021 * 1021).unwrap());
        assert!(!sieve.is_prime(1024).unwrap());
        assert!(sieve.is_prime(1_048_573).unwrap());
        assert_eq!(
            sieve.is_prime(1 << 20),
            Err(SieveError::BeyondTrialDivision {
                value: 1 << 20,
                ceiling: 1 << 10,
            })
        );
    }

    #[test]
    fn fail_fast_when_generation_in_flight() {
        let sieve = small(1 << 12, 1 << 10);
        sieve.state.store(GenerationState::Generating);
        assert_eq!(
            sieve.ensure_initialized(),
            Err(SieveError::ConcurrentInitialization)
        );
        assert_eq!(sieve.count(10), Err(SieveError::ConcurrentInitialization));
    }

    #[test]
    fn wait_policy_blocks_until_winner_finishes() {
        let sieve = Arc::new(
            Sieve::new(SieveConfig {
                init_policy: InitPolicy::Wait,
                ..SieveConfig::with_ceiling(1 << 12, 1 << 10)
            })
            .unwrap(),
        );
        sieve.state.store(GenerationState::Generating);

        let waiter = {
            let sieve = Arc::clone(&sieve);
            std::thread::spawn(move || sieve.count(100))
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());

        // Simulate the winner rolling back; the waiter then claims the build.
        {
            let _gate = sieve.init_gate.lock();
            sieve.state.store(GenerationState::NotStarted);
            sieve.init_done.notify_all();
        }
        assert_eq!(waiter.join().unwrap(), Ok(25));
        assert_eq!(sieve.metrics().initializations, 1);
    }

    #[test]
    fn reinitialisation_is_a_no_op() {
        let sieve = small(1 << 14, 1 << 12);
        sieve.generate_all().unwrap();
        let before = sieve.metrics();
        assert_eq!(before.segments_sieved, 4);
        sieve.ensure_initialized().unwrap();
        sieve.generate_all().unwrap();
        let after = sieve.metrics();
        assert_eq!(after.segments_sieved, before.segments_sieved);
        assert_eq!(after.initializations, 1);
        assert_eq!(after.extensions, before.extensions);
    }

    #[test]
    fn pooled_backing_answers_identically() {
        let sieve = Sieve::new(SieveConfig {
            backing: Backing::Pooled(PoolConfig::default()),
            ..SieveConfig::with_ceiling(1 << 14, 1 << 11)
        })
        .unwrap();
        assert_eq!(sieve.table_alloc.kind(), BufferKind::Pooled);
        assert_eq!(sieve.count(1 << 14).unwrap(), primes_below(1 << 14).len() as u32);
    }

    #[test]
    fn release_is_idempotent_and_blocks_queries() {
        let mut sieve = small(1 << 12, 1 << 10);
        sieve.count(500).unwrap();
        sieve.release();
        sieve.release();
        assert!(sieve.is_released());
        assert_eq!(sieve.count(10), Err(SieveError::Released));
        assert_eq!(sieve.metrics().table_bytes, 0);
    }
}

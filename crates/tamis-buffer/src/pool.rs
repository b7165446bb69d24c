//! Pooled buffers leased from reusable size-classed blocks.
//!
//! A [`BufferPool`] groups idle blocks by size class (the smallest power of
//! two that covers a request). Each class is a bounded crossbeam channel used
//! as a lock-free free list: leasing is a `try_recv`, returning a block is a
//! `try_send`, and a full class simply frees the block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::buffer::{Buffer, BufferKind, Fill};
use crate::config::{PoolConfig, PoolConfigError};
use crate::element::Element;
use crate::error::BufferError;

/// Idle blocks of one size class.
struct SizeClass<T> {
    idle_tx: Sender<Box<[T]>>,
    idle_rx: Receiver<Box<[T]>>,
}

/// Cumulative pool counters.
#[derive(Default)]
struct PoolCounters {
    leases: AtomicU64,
    reuse_hits: AtomicU64,
    reuse_misses: AtomicU64,
    oversize_leases: AtomicU64,
    returns_retained: AtomicU64,
    returns_dropped: AtomicU64,
}

/// Snapshot of a pool's cumulative counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of leases served.
    pub leases: u64,
    /// Leases satisfied by an idle block.
    pub reuse_hits: u64,
    /// Leases that allocated a fresh block for their size class.
    pub reuse_misses: u64,
    /// Leases above `max_pooled_len`, served with an unpooled block.
    pub oversize_leases: u64,
    /// Released blocks kept for reuse.
    pub returns_retained: u64,
    /// Released blocks freed (class full, or oversize).
    pub returns_dropped: u64,
}

/// A shared pool of reusable blocks of `T`.
///
/// Pools are shared through `Arc`; every [`PooledBuffer`] keeps its pool
/// alive until the block has been returned.
pub struct BufferPool<T: Element> {
    config: PoolConfig,
    classes: RwLock<IndexMap<usize, SizeClass<T>>>,
    counters: PoolCounters,
}

impl<T: Element> BufferPool<T> {
    /// Create a pool with the given configuration.
    pub fn new(config: PoolConfig) -> Result<Arc<Self>, PoolConfigError> {
        config.validate()?;
        Ok(Arc::new(Self {
            config,
            classes: RwLock::new(IndexMap::new()),
            counters: PoolCounters::default(),
        }))
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Lease a buffer of `len` logical elements.
    ///
    /// The physical block may be longer than `len`; the extra elements are
    /// never exposed.
    pub fn lease(self: &Arc<Self>, len: usize, fill: Fill) -> Result<PooledBuffer<T>, BufferError> {
        self.counters.leases.fetch_add(1, Ordering::Relaxed);

        let Some(class) = self.config.size_class(len) else {
            self.counters.oversize_leases.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(len, "oversize lease, allocating unpooled block");
            let block = allocate_block::<T>(len)?;
            return Ok(PooledBuffer::new(Arc::clone(self), block, len, None));
        };

        let (_, idle_rx) = self.class_channel(class);
        let block = match idle_rx.try_recv() {
            Ok(mut block) => {
                self.counters.reuse_hits.fetch_add(1, Ordering::Relaxed);
                if fill == Fill::Zeroed {
                    block[..len].fill(T::ZERO);
                }
                block
            }
            Err(_) => {
                self.counters.reuse_misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(len, class, "pool miss, allocating block");
                allocate_block::<T>(class)?
            }
        };
        Ok(PooledBuffer::new(Arc::clone(self), block, len, Some(class)))
    }

    /// Number of idle blocks currently retained across all classes.
    pub fn idle_blocks(&self) -> usize {
        self.classes.read().values().map(|c| c.idle_rx.len()).sum()
    }

    /// Free every idle block. Returns how many were freed.
    pub fn trim(&self) -> usize {
        let classes = self.classes.read();
        let mut freed = 0;
        for class in classes.values() {
            while class.idle_rx.try_recv().is_ok() {
                freed += 1;
            }
        }
        freed
    }

    /// Snapshot of the cumulative counters.
    pub fn stats(&self) -> PoolStats {
        let c = &self.counters;
        PoolStats {
            leases: c.leases.load(Ordering::Relaxed),
            reuse_hits: c.reuse_hits.load(Ordering::Relaxed),
            reuse_misses: c.reuse_misses.load(Ordering::Relaxed),
            oversize_leases: c.oversize_leases.load(Ordering::Relaxed),
            returns_retained: c.returns_retained.load(Ordering::Relaxed),
            returns_dropped: c.returns_dropped.load(Ordering::Relaxed),
        }
    }

    fn class_channel(&self, class: usize) -> (Sender<Box<[T]>>, Receiver<Box<[T]>>) {
        if let Some(c) = self.classes.read().get(&class) {
            return (c.idle_tx.clone(), c.idle_rx.clone());
        }
        let mut classes = self.classes.write();
        let c = classes.entry(class).or_insert_with(|| {
            let (idle_tx, idle_rx) = crossbeam_channel::bounded(self.config.max_retained_per_class);
            SizeClass { idle_tx, idle_rx }
        });
        (c.idle_tx.clone(), c.idle_rx.clone())
    }

    fn give_back(&self, class: Option<usize>, block: Box<[T]>) {
        let Some(class) = class else {
            self.counters.returns_dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let (idle_tx, _) = self.class_channel(class);
        match idle_tx.try_send(block) {
            Ok(()) => {
                self.counters.returns_retained.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.counters.returns_dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Allocate a zero-filled block, reporting failure instead of aborting.
fn allocate_block<T: Element>(len: usize) -> Result<Box<[T]>, BufferError> {
    let mut data: Vec<T> = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| BufferError::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    data.resize(len, T::ZERO);
    Ok(data.into_boxed_slice())
}

/// A buffer leased from a [`BufferPool`].
///
/// Only the first `len` elements of the leased block are visible. Releasing
/// (or dropping) the buffer returns the block to its pool.
pub struct PooledBuffer<T: Element> {
    block: Option<Box<[T]>>,
    len: usize,
    class: Option<usize>,
    pool: Arc<BufferPool<T>>,
}

impl<T: Element> PooledBuffer<T> {
    fn new(pool: Arc<BufferPool<T>>, block: Box<[T]>, len: usize, class: Option<usize>) -> Self {
        debug_assert!(block.len() >= len);
        Self {
            block: Some(block),
            len,
            class,
            pool,
        }
    }

    /// Length of the physical block backing this buffer, if still held.
    pub fn block_len(&self) -> Option<usize> {
        self.block.as_ref().map(|b| b.len())
    }
}

impl<T: Element> Buffer<T> for PooledBuffer<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn kind(&self) -> BufferKind {
        BufferKind::Pooled
    }

    fn is_released(&self) -> bool {
        self.block.is_none()
    }

    fn memory_bytes(&self) -> usize {
        self.block
            .as_ref()
            .map_or(0, |b| b.len() * std::mem::size_of::<T>())
    }

    fn as_slice(&self) -> Result<&[T], BufferError> {
        self.block
            .as_deref()
            .map(|b| &b[..self.len])
            .ok_or(BufferError::Released)
    }

    fn as_mut_slice(&mut self) -> Result<&mut [T], BufferError> {
        let len = self.len;
        self.block
            .as_deref_mut()
            .map(|b| &mut b[..len])
            .ok_or(BufferError::Released)
    }

    fn release(&mut self) {
        if let Some(block) = self.block.take() {
            self.pool.give_back(self.class, block);
        }
    }
}

impl<T: Element> Drop for PooledBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(max_retained: usize) -> Arc<BufferPool<u32>> {
        BufferPool::new(PoolConfig {
            min_block_len: 16,
            max_retained_per_class: max_retained,
            max_pooled_len: 1024,
        })
        .unwrap()
    }

    #[test]
    fn lease_exposes_only_logical_length() {
        let pool = small_pool(4);
        let buf = pool.lease(100, Fill::Zeroed).unwrap();
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.block_len(), Some(128));
        assert_eq!(buf.as_slice().unwrap().len(), 100);
        assert_eq!(buf.memory_bytes(), 128 * 4);
        assert_eq!(buf.get(100).unwrap_err(), BufferError::OutOfBounds { index: 100, len: 100 });
    }

    #[test]
    fn released_block_is_reused() {
        let pool = small_pool(4);
        let mut first = pool.lease(50, Fill::Zeroed).unwrap();
        first.as_mut_slice().unwrap().fill(7);
        drop(first);
        assert_eq!(pool.idle_blocks(), 1);

        let second = pool.lease(60, Fill::Unspecified).unwrap();
        let stats = pool.stats();
        assert_eq!(stats.reuse_hits, 1);
        assert_eq!(stats.reuse_misses, 1);
        // Unspecified fill keeps whatever the previous lease wrote.
        assert_eq!(second.as_slice().unwrap()[0], 7);
    }

    #[test]
    fn zeroed_lease_scrubs_recycled_block() {
        let pool = small_pool(4);
        let mut first = pool.lease(32, Fill::Zeroed).unwrap();
        first.as_mut_slice().unwrap().fill(u32::MAX);
        drop(first);

        let second = pool.lease(32, Fill::Zeroed).unwrap();
        assert!(second.as_slice().unwrap().iter().all(|&w| w == 0));
    }

    #[test]
    fn full_class_drops_returned_blocks() {
        let pool = small_pool(1);
        let a = pool.lease(16, Fill::Zeroed).unwrap();
        let b = pool.lease(16, Fill::Zeroed).unwrap();
        drop(a);
        drop(b);
        let stats = pool.stats();
        assert_eq!(stats.returns_retained, 1);
        assert_eq!(stats.returns_dropped, 1);
        assert_eq!(pool.idle_blocks(), 1);
    }

    #[test]
    fn oversize_lease_is_exact_and_not_retained() {
        let pool = small_pool(4);
        let buf = pool.lease(2000, Fill::Zeroed).unwrap();
        assert_eq!(buf.block_len(), Some(2000));
        drop(buf);
        assert_eq!(pool.idle_blocks(), 0);
        assert_eq!(pool.stats().oversize_leases, 1);
    }

    #[test]
    fn release_is_idempotent_and_blocks_access() {
        let pool = small_pool(4);
        let mut buf = pool.lease(10, Fill::Zeroed).unwrap();
        buf.release();
        buf.release();
        assert!(buf.is_released());
        assert_eq!(buf.as_slice().unwrap_err(), BufferError::Released);
        assert_eq!(pool.stats().returns_retained, 1);
    }

    #[test]
    fn trim_frees_idle_blocks() {
        let pool = small_pool(4);
        drop(pool.lease(16, Fill::Zeroed).unwrap());
        drop(pool.lease(64, Fill::Zeroed).unwrap());
        assert_eq!(pool.idle_blocks(), 2);
        assert_eq!(pool.trim(), 2);
        assert_eq!(pool.idle_blocks(), 0);
    }

    #[test]
    fn leases_from_many_threads() {
        let pool = small_pool(8);
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for i in 0..100u32 {
                        let mut buf = pool.lease(20 + i as usize, Fill::Zeroed).unwrap();
                        buf.as_mut_slice().unwrap().fill(t);
                        assert!(buf.as_slice().unwrap().iter().all(|&w| w == t));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.stats().leases, 400);
    }
}

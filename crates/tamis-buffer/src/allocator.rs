//! Uniform construction, cloning, and bulk copy across providers.

use std::sync::Arc;

use crate::buffer::{Buffer, BufferKind, Fill};
use crate::element::Element;
use crate::error::BufferError;
use crate::pool::BufferPool;
use crate::raw::RawBuffer;

/// Transfers at or below this many bytes are copied element by element.
pub const BLOCK_COPY_THRESHOLD_BYTES: usize = 64;

/// How [`BufferAllocator::copy`] moves a transfer of a given size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyStrategy {
    /// One assignment per element; avoids call overhead on tiny transfers.
    ElementWise,
    /// A single `memcpy` over the whole range.
    Block,
}

/// Strategy used for copying `count` elements of `T`.
pub fn copy_strategy<T: Element>(count: usize) -> CopyStrategy {
    if count.saturating_mul(std::mem::size_of::<T>()) <= BLOCK_COPY_THRESHOLD_BYTES {
        CopyStrategy::ElementWise
    } else {
        CopyStrategy::Block
    }
}

enum Provider<T: Element> {
    Direct,
    Pooled(Arc<BufferPool<T>>),
}

impl<T: Element> Clone for Provider<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct => Self::Direct,
            Self::Pooled(pool) => Self::Pooled(Arc::clone(pool)),
        }
    }
}

/// Factory handing out buffers from one provider.
///
/// Callers hold `Box<dyn Buffer<T>>` and never need to know which provider
/// produced it.
#[derive(Clone)]
pub struct BufferAllocator<T: Element> {
    provider: Provider<T>,
}

impl<T: Element> BufferAllocator<T> {
    /// Allocator backed by the global allocator.
    pub fn direct() -> Self {
        Self {
            provider: Provider::Direct,
        }
    }

    /// Allocator leasing from `pool`.
    pub fn pooled(pool: Arc<BufferPool<T>>) -> Self {
        Self {
            provider: Provider::Pooled(pool),
        }
    }

    /// Which provider backs buffers from this allocator.
    pub fn kind(&self) -> BufferKind {
        match self.provider {
            Provider::Direct => BufferKind::Direct,
            Provider::Pooled(_) => BufferKind::Pooled,
        }
    }

    /// The backing pool, for pooled allocators.
    pub fn pool(&self) -> Option<&Arc<BufferPool<T>>> {
        match &self.provider {
            Provider::Direct => None,
            Provider::Pooled(pool) => Some(pool),
        }
    }

    /// Allocate a buffer of `len` elements.
    pub fn allocate(&self, len: usize, fill: Fill) -> Result<Box<dyn Buffer<T>>, BufferError> {
        match &self.provider {
            Provider::Direct => Ok(Box::new(RawBuffer::<T>::allocate(len, fill)?)),
            Provider::Pooled(pool) => Ok(Box::new(pool.lease(len, fill)?)),
        }
    }

    /// Allocate a new buffer of equal length and copy every element of
    /// `source` into it. The clone's lifetime is independent of the source.
    pub fn clone_buffer(&self, source: &dyn Buffer<T>) -> Result<Box<dyn Buffer<T>>, BufferError> {
        let src = source.as_slice()?;
        let mut clone = self.allocate(src.len(), Fill::Unspecified)?;
        Self::copy(src, clone.as_mut_slice()?, src.len())?;
        Ok(clone)
    }

    /// Copy the first `count` elements of `source` into `destination`.
    ///
    /// Uses [`copy_strategy`] to pick element-wise or block copy.
    pub fn copy(source: &[T], destination: &mut [T], count: usize) -> Result<(), BufferError> {
        if count > source.len() || count > destination.len() {
            return Err(BufferError::CopyOutOfRange {
                count,
                source_len: source.len(),
                destination_len: destination.len(),
            });
        }
        match copy_strategy::<T>(count) {
            CopyStrategy::ElementWise => {
                for (dst, src) in destination[..count].iter_mut().zip(&source[..count]) {
                    *dst = *src;
                }
            }
            CopyStrategy::Block => destination[..count].copy_from_slice(&source[..count]),
        }
        Ok(())
    }

    /// [`copy`](Self::copy) between two buffers.
    pub fn copy_buffers(
        source: &dyn Buffer<T>,
        destination: &mut dyn Buffer<T>,
        count: usize,
    ) -> Result<(), BufferError> {
        Self::copy(source.as_slice()?, destination.as_mut_slice()?, count)
    }
}

impl<T: Element> Default for BufferAllocator<T> {
    fn default() -> Self {
        Self::direct()
    }
}

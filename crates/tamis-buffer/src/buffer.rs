//! The fixed-length buffer contract shared by every provider.

use crate::element::Element;
use crate::error::BufferError;

/// Which provider backs a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Memory obtained directly from the global allocator.
    Direct,
    /// A block leased from a [`BufferPool`](crate::BufferPool).
    Pooled,
}

/// Initial contents requested at allocation time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fill {
    /// Every element is [`Element::ZERO`].
    Zeroed,
    /// Contents are unspecified. Recycled pool blocks keep stale data.
    #[default]
    Unspecified,
}

/// A fixed-length, contiguous store of `T`.
///
/// A buffer has a single owner. [`release`](Self::release) frees (or returns)
/// the storage exactly once; every later access reports
/// [`BufferError::Released`]. Dropping a buffer releases it.
pub trait Buffer<T: Element>: Send + Sync {
    /// Logical length in elements.
    fn len(&self) -> usize;

    /// Whether the logical length is zero.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Which provider backs this buffer.
    fn kind(&self) -> BufferKind;

    /// Whether [`release`](Self::release) has already run.
    fn is_released(&self) -> bool;

    /// Physical footprint in bytes. Pooled blocks may exceed the logical size.
    fn memory_bytes(&self) -> usize;

    /// Contiguous view over all logical elements.
    fn as_slice(&self) -> Result<&[T], BufferError>;

    /// Mutable contiguous view over all logical elements.
    fn as_mut_slice(&mut self) -> Result<&mut [T], BufferError>;

    /// Free or return the storage. Later calls are no-ops.
    fn release(&mut self);

    /// Shared reference to element `index`.
    fn get(&self, index: usize) -> Result<&T, BufferError> {
        let slice = self.as_slice()?;
        let len = slice.len();
        slice.get(index).ok_or(BufferError::OutOfBounds {
            index: index as u64,
            len,
        })
    }

    /// Mutable reference to element `index`.
    fn get_mut(&mut self, index: usize) -> Result<&mut T, BufferError> {
        let slice = self.as_mut_slice()?;
        let len = slice.len();
        slice.get_mut(index).ok_or(BufferError::OutOfBounds {
            index: index as u64,
            len,
        })
    }
}

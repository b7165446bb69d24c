//! Direct-allocation buffers over raw global-allocator memory.
//!
//! [`RawBuffer`] is the only place in the crate that touches raw pointers.
//! Every `unsafe` block carries a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::buffer::{Buffer, BufferKind, Fill};
use crate::element::Element;
use crate::error::BufferError;

/// A fixed-length buffer that owns memory from the global allocator.
///
/// The memory is always handed out initialised: [`Fill::Zeroed`] and
/// [`Fill::Unspecified`] both go through `alloc_zeroed`, which for large
/// blocks maps fresh zero pages and costs the same as an uninitialised
/// allocation.
///
/// Besides the [`Buffer`] contract, `RawBuffer` offers 64-bit indexing
/// ([`get_wide`](Self::get_wide)) and an unchecked fast path
/// ([`get_unchecked_mut`](Self::get_unchecked_mut)).
pub struct RawBuffer<T: Element> {
    ptr: NonNull<T>,
    len: usize,
    released: bool,
    _owns: PhantomData<T>,
}

// SAFETY: RawBuffer owns its allocation exclusively; sending it moves that
// ownership, and shared access only hands out `&T` where `T: Sync`.
unsafe impl<T: Element> Send for RawBuffer<T> {}
// SAFETY: `&RawBuffer` only permits reads through `&T`, and `T: Sync`.
unsafe impl<T: Element> Sync for RawBuffer<T> {}

impl<T: Element> RawBuffer<T> {
    /// Allocate `len` elements.
    ///
    /// # Errors
    ///
    /// [`BufferError::CapacityOverflow`] if the byte size overflows,
    /// [`BufferError::AllocationFailed`] if the allocator returns null.
    pub fn allocate(len: usize, _fill: Fill) -> Result<Self, BufferError> {
        let layout = Self::layout(len)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
                released: false,
                _owns: PhantomData,
            });
        }
        // SAFETY: layout has non-zero size (checked above).
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(BufferError::AllocationFailed {
            bytes: layout.size(),
        })?;
        Ok(Self {
            ptr,
            len,
            released: false,
            _owns: PhantomData,
        })
    }

    fn layout(len: usize) -> Result<Layout, BufferError> {
        Layout::array::<T>(len).map_err(|_| BufferError::CapacityOverflow {
            len,
            element_size: std::mem::size_of::<T>(),
        })
    }

    /// Shared reference to element `index`, addressed with a 64-bit index.
    pub fn get_wide(&self, index: u64) -> Result<&T, BufferError> {
        let i = self.check_wide(index)?;
        self.get(i)
    }

    /// Mutable reference to element `index`, addressed with a 64-bit index.
    pub fn get_wide_mut(&mut self, index: u64) -> Result<&mut T, BufferError> {
        let i = self.check_wide(index)?;
        self.get_mut(i)
    }

    fn check_wide(&self, index: u64) -> Result<usize, BufferError> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < self.len)
            .ok_or(BufferError::OutOfBounds {
                index,
                len: self.len,
            })
    }

    /// Shared reference to element `index` without release or bounds checks.
    ///
    /// # Safety
    ///
    /// The buffer must not have been released and `index < self.len()`.
    pub unsafe fn get_unchecked(&self, index: usize) -> &T {
        debug_assert!(!self.released && index < self.len);
        // SAFETY: the caller guarantees a live allocation and an in-bounds
        // index; the element was initialised at allocation time.
        unsafe { &*self.ptr.as_ptr().add(index) }
    }

    /// Mutable reference to element `index` without release or bounds checks.
    ///
    /// # Safety
    ///
    /// The buffer must not have been released and `index < self.len()`.
    pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(!self.released && index < self.len);
        // SAFETY: as for `get_unchecked`; `&mut self` guarantees uniqueness.
        unsafe { &mut *self.ptr.as_ptr().add(index) }
    }
}

impl<T: Element> Buffer<T> for RawBuffer<T> {
    fn len(&self) -> usize {
        self.len
    }

    fn kind(&self) -> BufferKind {
        BufferKind::Direct
    }

    fn is_released(&self) -> bool {
        self.released
    }

    fn memory_bytes(&self) -> usize {
        if self.released {
            0
        } else {
            self.len * std::mem::size_of::<T>()
        }
    }

    fn as_slice(&self) -> Result<&[T], BufferError> {
        if self.released {
            return Err(BufferError::Released);
        }
        // SAFETY: the allocation is live, holds `len` initialised elements,
        // and is correctly aligned for `T` (or dangling with zero size).
        Ok(unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) })
    }

    fn as_mut_slice(&mut self) -> Result<&mut [T], BufferError> {
        if self.released {
            return Err(BufferError::Released);
        }
        // SAFETY: as for `as_slice`; `&mut self` guarantees uniqueness.
        Ok(unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) })
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        // The layout was valid at allocation, so recomputing it cannot fail.
        if let Ok(layout) = Self::layout(self.len) {
            if layout.size() != 0 {
                // SAFETY: `ptr` came from `alloc_zeroed` with this exact
                // layout and has not been freed (guarded by `released`).
                unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
            }
        }
        self.ptr = NonNull::dangling();
    }
}

impl<T: Element> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Element + std::fmt::Debug> std::fmt::Debug for RawBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawBuffer")
            .field("len", &self.len)
            .field("released", &self.released)
            .finish()
    }
}

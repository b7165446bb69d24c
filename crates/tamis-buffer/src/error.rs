//! Buffer-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur while allocating, accessing, or copying buffers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BufferError {
    /// The underlying store could not satisfy the request.
    AllocationFailed {
        /// Number of bytes requested.
        bytes: usize,
    },
    /// `len * size_of::<T>()` does not fit in `isize`.
    CapacityOverflow {
        /// Requested element count.
        len: usize,
        /// Size of one element in bytes.
        element_size: usize,
    },
    /// The buffer was accessed after [`release`](crate::Buffer::release).
    Released,
    /// Index past the logical length of the buffer.
    OutOfBounds {
        /// The requested index.
        index: u64,
        /// Logical length of the buffer.
        len: usize,
    },
    /// A copy asked for more elements than one of its sides holds.
    CopyOutOfRange {
        /// Number of elements requested.
        count: usize,
        /// Length of the source.
        source_len: usize,
        /// Length of the destination.
        destination_len: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { bytes } => {
                write!(f, "allocation of {bytes} bytes failed")
            }
            Self::CapacityOverflow { len, element_size } => {
                write!(
                    f,
                    "capacity overflow: {len} elements of {element_size} bytes"
                )
            }
            Self::Released => write!(f, "buffer accessed after release"),
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for buffer of length {len}")
            }
            Self::CopyOutOfRange {
                count,
                source_len,
                destination_len,
            } => write!(
                f,
                "copy of {count} elements exceeds source ({source_len}) or destination ({destination_len})"
            ),
        }
    }
}

impl Error for BufferError {}

//! Fixed-size raw and pooled buffers backing the tamis sieve.
//!
//! Every buffer implements the [`Buffer`] contract: fixed length, indexed
//! access returning references, a contiguous view, and an idempotent
//! [`release`](Buffer::release) that also runs on drop. This crate is one of
//! two that may contain `unsafe` code; here it is confined to `raw.rs` and
//! the [`Element`] impls.
//!
//! # Architecture
//!
//! ```text
//! BufferAllocator<T> (factory: allocate / clone_buffer / copy)
//! ├── Direct  → RawBuffer<T>     (global allocator, freed on release)
//! └── Pooled  → PooledBuffer<T>  (leased from Arc<BufferPool<T>>)
//!                └── BufferPool<T>: IndexMap<size class, bounded channel of idle blocks>
//! ```
//!
//! # Copy strategy
//!
//! [`BufferAllocator::copy`] moves transfers of at most
//! [`BLOCK_COPY_THRESHOLD_BYTES`] element by element and everything larger
//! with a single block copy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod allocator;
pub mod buffer;
pub mod config;
pub mod element;
pub mod error;
pub mod pool;
pub mod raw;

// Public re-exports for the primary API surface.
pub use allocator::{copy_strategy, BufferAllocator, CopyStrategy, BLOCK_COPY_THRESHOLD_BYTES};
pub use buffer::{Buffer, BufferKind, Fill};
pub use config::{PoolConfig, PoolConfigError};
pub use element::Element;
pub use error::BufferError;
pub use pool::{BufferPool, PoolStats, PooledBuffer};
pub use raw::RawBuffer;

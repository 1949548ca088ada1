//! Single-arena compacting allocator addressed through generational handles.
//!
//! Callers receive an opaque [`Handle`] instead of an address. The bytes
//! behind a handle may move at any time (growth, compaction); every access
//! revalidates the handle's slot index, in-use flag and generation, so a
//! stale handle is reported instead of silently reading someone else's data.
//!
//! # Architecture
//!
//! ```text
//! Allocator (one parking_lot mutex, lifecycle flag)
//! └── CompactingArena (&mut self core)
//!     ├── ByteArena   (Vec<u8>, doubling growth, bump cursor)
//!     ├── BlockTable  (Block { offset, size, in_use, generation } + free list)
//!     └── compact()   (index-order slide toward offset 0)
//! ```
//!
//! # Handle lifecycle
//!
//! - **allocate:** a freed slot is reused with its generation advanced once,
//!   or a new slot is appended at generation 1.
//! - **free:** only the in-use flag is cleared; the generation stays, and the
//!   bytes stay in place until the next compaction.
//! - **compact:** live blocks slide down; handles do not change.
//!
//! # Example
//!
//! ```rust
//! use scma_arena::{Allocator, ArenaConfig};
//!
//! let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
//! let a = alloc.allocate(16).unwrap();
//! let b = alloc.allocate(32).unwrap();
//! alloc.write(b, 0, b"survives").unwrap();
//! alloc.free(a).unwrap();
//! alloc.compact().unwrap();
//! assert!(!alloc.is_valid(a));
//! assert_eq!(&alloc.resolve(b).unwrap()[..8], b"survives");
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod accessor;
pub mod allocator;
pub mod arena;
pub mod bytes;
pub mod compact;
pub mod config;
pub mod error;
mod growth;
pub mod stats;
pub mod table;

// Public re-exports for the primary API surface.
pub use accessor::Accessor;
pub use allocator::{Allocator, BlockGuard};
pub use arena::CompactingArena;
pub use compact::CompactionReport;
pub use config::{ArenaConfig, CompactionPolicy};
pub use error::ArenaError;
pub use scma_core::{ErrorKind, Generation, Handle, Rejection};
pub use stats::{ArenaStats, BlockInfo};

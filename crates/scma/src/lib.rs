//! SCMA: a single-arena compacting memory allocator.
//!
//! This is the top-level facade crate that re-exports the public API of the
//! SCMA sub-crates. Callers hold [`types::Handle`]s instead of addresses; the
//! allocator may move blocks during growth or compaction, and every access
//! revalidates the handle first.
//!
//! # Quick start
//!
//! ```rust
//! use scma::prelude::*;
//!
//! let alloc = Allocator::with_config(ArenaConfig::new(1024)).unwrap();
//!
//! let a = alloc.allocate(16).unwrap();
//! let b = alloc.allocate(32).unwrap();
//! alloc.write(b, 0, &[7; 32]).unwrap();
//! alloc.free(a).unwrap();
//!
//! // A fresh allocation reuses a's slot under a new generation.
//! let c = alloc.allocate(8).unwrap();
//! assert_eq!(c.index(), a.index());
//! assert!(!alloc.is_valid(a));
//!
//! alloc.compact().unwrap();
//! assert_eq!(alloc.stats().unwrap().used_size, 40);
//! assert_eq!(&*alloc.resolve(b).unwrap(), &[7; 32]);
//! ```
//!
//! # Typed access
//!
//! ```rust
//! use scma::prelude::*;
//!
//! let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
//! let values = Accessor::<u32>::allocate(&alloc, 3).unwrap();
//! values.write_at(2, &9).unwrap();
//! values.update_at(2, |v| *v *= 2).unwrap();
//! assert_eq!(values.to_vec().unwrap(), vec![0, 0, 18]);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `scma-core` | `Handle`, `Generation`, error kinds |
//! | [`arena`] | `scma-arena` | Allocator, arena, block table, compaction |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Handle, generation and error-kind types (`scma-core`).
pub use scma_core as types;

/// The allocator and its building blocks (`scma-arena`).
///
/// [`arena::Allocator`] is the thread-safe entry point;
/// [`arena::CompactingArena`] is the same allocator without the lock, for
/// single-owner use.
pub use scma_arena as arena;

/// Common imports for typical SCMA usage.
///
/// ```rust
/// use scma::prelude::*;
/// ```
pub mod prelude {
    // Allocator
    pub use scma_arena::{Accessor, Allocator, BlockGuard, CompactingArena};

    // Configuration and reporting
    pub use scma_arena::{ArenaConfig, ArenaStats, BlockInfo, CompactionPolicy, CompactionReport};

    // Handles and errors
    pub use scma_arena::ArenaError;
    pub use scma_core::{ErrorKind, Generation, Handle, Rejection};
}

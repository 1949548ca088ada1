//! Core types for the SCMA handle-based compacting allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the allocator and its callers: the opaque
//! [`Handle`], the per-slot [`Generation`] counter, and the error taxonomy
//! ([`ErrorKind`], [`Rejection`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod generation;
pub mod handle;

pub use error::{ErrorKind, Rejection};
pub use generation::{next_generation, Generation};
pub use handle::Handle;

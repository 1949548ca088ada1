//! Error classification shared across the workspace.
//!
//! The allocator's concrete error type lives in `scma-arena`; this module
//! holds the coarse [`ErrorKind`] callers branch on and the [`Rejection`]
//! reason attached to every handle that fails validation.

use std::fmt;

/// Coarse error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Zero-size request, sentinel handle, or a malformed typed access.
    InvalidArgument,
    /// A well-formed handle failed the index, in-use or generation check.
    InvalidHandle,
    /// Growth would exceed the configured or platform size limit.
    CapacityExhausted,
    /// The backing reallocation itself failed.
    AllocationFailed,
    /// A byte or element range falls outside its block.
    OutOfRange,
    /// The allocator is not in the lifecycle state the call requires.
    InvalidState,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidArgument => "invalid argument",
            Self::InvalidHandle => "invalid handle",
            Self::CapacityExhausted => "capacity exhausted",
            Self::AllocationFailed => "allocation failed",
            Self::OutOfRange => "out of range",
            Self::InvalidState => "invalid state",
        };
        f.write_str(s)
    }
}

/// Why a structurally valid handle was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The index is past the end of the block table.
    IndexOutOfRange,
    /// The slot exists but is not in use (freed, not yet reused).
    Freed,
    /// The slot was reused; the handle's generation is older.
    GenerationMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::IndexOutOfRange => "index out of range",
            Self::Freed => "block was freed",
            Self::GenerationMismatch => "generation mismatch",
        };
        f.write_str(s)
    }
}

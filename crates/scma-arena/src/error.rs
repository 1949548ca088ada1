//! Arena-specific error types.

use scma_core::{ErrorKind, Handle, Rejection};
use thiserror::Error;

/// Errors that can occur during arena operations.
///
/// Every failing operation leaves the arena exactly as it was before the
/// call: no partial growth, no half-placed block.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArenaError {
    /// Zero-byte allocations are rejected.
    #[error("allocation size must be non-zero")]
    ZeroSize,

    /// The handle is the all-bits-set sentinel.
    #[error("malformed handle: {handle}")]
    MalformedHandle {
        /// The offending handle.
        handle: Handle,
    },

    /// A well-formed handle that no longer (or never did) name a live block.
    #[error("invalid handle {handle}: {rejection}")]
    InvalidHandle {
        /// The offending handle.
        handle: Handle,
        /// Which validation step rejected it.
        rejection: Rejection,
    },

    /// Growth would exceed the arena's size limit.
    #[error("capacity exhausted: requested {requested}, limit {limit}")]
    CapacityExhausted {
        /// Bytes (or block records) the operation needed in total.
        requested: usize,
        /// The limit that would have been exceeded.
        limit: usize,
    },

    /// The backing reallocation failed.
    #[error("allocation failed while growing to {requested}")]
    AllocationFailed {
        /// Bytes (or block records) the reallocation was asked for.
        requested: usize,
    },

    /// A byte or element range does not fit inside the block.
    #[error("range {offset}+{len} outside block of {size} bytes")]
    OutOfRange {
        /// Start of the requested range, relative to the block.
        offset: usize,
        /// Length of the requested range.
        len: usize,
        /// Size of the block.
        size: usize,
    },

    /// A typed access whose element type cannot be laid over the block.
    #[error("type mismatch: element of {element} bytes over block of {size} bytes")]
    TypeMismatch {
        /// `size_of` the element type.
        element: usize,
        /// Size of the block.
        size: usize,
    },

    /// The allocator has not been initialized, or was shut down.
    #[error("allocator is not initialized")]
    NotInitialized,

    /// `initialize` was called on a live allocator.
    #[error("allocator is already initialized")]
    AlreadyInitialized,
}

impl ArenaError {
    /// Coarse category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroSize | Self::MalformedHandle { .. } | Self::TypeMismatch { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::InvalidHandle { .. } => ErrorKind::InvalidHandle,
            Self::CapacityExhausted { .. } => ErrorKind::CapacityExhausted,
            Self::AllocationFailed { .. } => ErrorKind::AllocationFailed,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::NotInitialized | Self::AlreadyInitialized => ErrorKind::InvalidState,
        }
    }

    /// The rejection reason, if this is an [`ArenaError::InvalidHandle`].
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::InvalidHandle { rejection, .. } => Some(*rejection),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scma_core::Generation;

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(ArenaError::ZeroSize.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            ArenaError::MalformedHandle {
                handle: Handle::INVALID
            }
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            ArenaError::CapacityExhausted {
                requested: 10,
                limit: 5
            }
            .kind(),
            ErrorKind::CapacityExhausted
        );
        assert_eq!(
            ArenaError::AllocationFailed { requested: 10 }.kind(),
            ErrorKind::AllocationFailed
        );
        assert_eq!(ArenaError::NotInitialized.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn display_names_the_handle() {
        let err = ArenaError::InvalidHandle {
            handle: Handle::new(3, Generation(2)),
            rejection: Rejection::Freed,
        };
        assert_eq!(
            err.to_string(),
            "invalid handle Handle(idx=3, gen=2): block was freed"
        );
        assert_eq!(err.rejection(), Some(Rejection::Freed));
    }
}

//! Opaque allocation handles.
//!
//! A [`Handle`] names an allocation by slot index and generation instead of
//! by address. The allocator may move the bytes behind a handle at any time
//! (growth, compaction); the handle stays the same and is revalidated on
//! every use, so a stale handle is reported instead of reading wrong data.

use std::fmt;

use crate::generation::Generation;

/// Weak, revalidated reference to an allocation.
///
/// Handles do not own anything. Dropping one leaks nothing and freeing the
/// allocation does not invalidate copies at compile time; every allocator
/// call checks the slot index, the slot's in-use flag and the generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct Handle {
    index: u32,
    generation: Generation,
}

impl Handle {
    /// The invalid handle: all bits set in both fields.
    pub const INVALID: Self = Self {
        index: u32::MAX,
        generation: Generation::INVALID,
    };

    /// Assemble a handle from its parts.
    ///
    /// Allocators mint handles through this; a hand-built handle only
    /// validates if it happens to match a live block.
    pub const fn new(index: u32, generation: Generation) -> Self {
        Self { index, generation }
    }

    /// Slot index in the block table.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether this is [`Handle::INVALID`] (all bits set in both fields).
    ///
    /// Only the full sentinel is structurally malformed. A handle with just
    /// one field maxed out is well-formed and fails ordinary validation: no
    /// slot sits at index `u32::MAX`, and no slot is ever issued generation
    /// `u32::MAX`.
    pub fn is_sentinel(&self) -> bool {
        self.index == u32::MAX && self.generation == Generation::INVALID
    }

    /// Pack into a `u64`: upper 32 bits index, lower 32 bits generation.
    pub fn to_bits(self) -> u64 {
        ((self.index as u64) << 32) | (self.generation.0 as u64)
    }

    /// Inverse of [`Handle::to_bits`].
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: (bits >> 32) as u32,
            generation: Generation(bits as u32),
        }
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            return write!(f, "Handle(invalid)");
        }
        write!(f, "Handle(idx={}, gen={})", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_is_sentinel() {
        assert!(Handle::INVALID.is_sentinel());
        assert_eq!(Handle::default(), Handle::INVALID);
    }

    #[test]
    fn only_both_fields_maxed_is_sentinel() {
        assert!(Handle::new(u32::MAX, Generation::INVALID).is_sentinel());
        assert!(!Handle::new(u32::MAX, Generation(3)).is_sentinel());
        assert!(!Handle::new(3, Generation::INVALID).is_sentinel());
        assert!(!Handle::new(3, Generation(3)).is_sentinel());
    }

    #[test]
    fn bits_layout() {
        let h = Handle::new(2, Generation(7));
        assert_eq!(h.to_bits(), (2u64 << 32) | 7);
        assert_eq!(Handle::from_bits(h.to_bits()), h);
        assert_eq!(Handle::from_bits(u64::MAX), Handle::INVALID);
    }

    #[test]
    fn display_marks_invalid() {
        assert_eq!(Handle::INVALID.to_string(), "Handle(invalid)");
        assert_eq!(Handle::new(1, Generation(2)).to_string(), "Handle(idx=1, gen=2)");
    }
}

//! The byte arena: one growable contiguous buffer holding every payload.
//!
//! The buffer is kept fully initialised (`data.len()` is the capacity), so
//! every range below the capacity can be sliced safely. `used` is the bump
//! cursor: bytes past it are spare, bytes before it belong to live blocks
//! or to freed blocks awaiting compaction.

use std::ops::Range;

use crate::error::ArenaError;
use crate::growth::grown_capacity;

/// Growable contiguous byte storage with a bump cursor.
pub struct ByteArena {
    /// Backing storage. Length equals the arena capacity.
    data: Vec<u8>,
    /// Bump cursor: first byte not covered by any placed block.
    used: usize,
    /// Capacity limit in bytes.
    limit: usize,
}

impl ByteArena {
    /// Create an arena with `capacity` zeroed bytes and the given limit.
    pub fn new(capacity: usize, limit: usize) -> Result<Self, ArenaError> {
        let mut arena = Self {
            data: Vec::new(),
            used: 0,
            limit,
        };
        arena.ensure_capacity(capacity)?;
        Ok(arena)
    }

    /// Grow the arena so it holds at least `required` bytes.
    ///
    /// No-op if already large enough. On failure nothing changes: existing
    /// bytes, the cursor and the capacity are untouched.
    pub fn ensure_capacity(&mut self, required: usize) -> Result<(), ArenaError> {
        let Some(new_capacity) = grown_capacity(self.data.len(), required, self.limit)? else {
            return Ok(());
        };
        self.data
            .try_reserve_exact(new_capacity - self.data.len())
            .map_err(|_| ArenaError::AllocationFailed {
                requested: new_capacity,
            })?;
        self.data.resize(new_capacity, 0);
        tracing::debug!(
            capacity = new_capacity,
            required,
            "byte arena grown"
        );
        Ok(())
    }

    /// Shrink the capacity back to `capacity` after a rolled-back growth.
    ///
    /// Only bytes past both `capacity` and the cursor are dropped.
    pub(crate) fn restore_capacity(&mut self, capacity: usize) {
        if capacity >= self.used && capacity < self.data.len() {
            self.data.truncate(capacity);
        }
    }

    /// Bump-allocate `len` zeroed bytes at the cursor.
    ///
    /// The caller must have ensured capacity for `used + len`.
    pub(crate) fn bump(&mut self, len: usize) -> usize {
        let offset = self.used;
        let end = offset + len;
        self.data[offset..end].fill(0);
        self.used = end;
        offset
    }

    /// Move `len` bytes from `src` down to `dst` (overlap allowed).
    pub(crate) fn move_bytes(&mut self, src: usize, len: usize, dst: usize) {
        self.data.copy_within(src..src + len, dst);
    }

    /// Set the cursor after compaction.
    pub(crate) fn set_used(&mut self, used: usize) {
        debug_assert!(used <= self.data.len());
        self.used = used;
    }

    /// Shared view of a byte range.
    ///
    /// # Panics
    ///
    /// Panics if `range` exceeds the capacity.
    pub fn slice(&self, range: Range<usize>) -> &[u8] {
        &self.data[range]
    }

    /// Mutable view of a byte range.
    ///
    /// # Panics
    ///
    /// Panics if `range` exceeds the capacity.
    pub fn slice_mut(&mut self, range: Range<usize>) -> &mut [u8] {
        &mut self.data[range]
    }

    /// Bytes currently covered by placed blocks (live or freed).
    pub fn used(&self) -> usize {
        self.used
    }

    /// Total capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Remaining spare bytes past the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.used
    }

    /// The configured byte limit.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_lazy() {
        let arena = ByteArena::new(0, 1024).unwrap();
        assert_eq!(arena.capacity(), 0);
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn bump_returns_sequential_zeroed_ranges() {
        let mut arena = ByteArena::new(64, 1024).unwrap();
        let a = arena.bump(10);
        let b = arena.bump(20);
        assert_eq!(a, 0);
        assert_eq!(b, 10);
        assert_eq!(arena.used(), 30);
        assert!(arena.slice(b..b + 20).iter().all(|&x| x == 0));
    }

    #[test]
    fn growth_preserves_contents() {
        let mut arena = ByteArena::new(8, 1024).unwrap();
        let off = arena.bump(8);
        arena.slice_mut(off..off + 8).copy_from_slice(b"abcdefgh");
        arena.ensure_capacity(9).unwrap();
        assert_eq!(arena.capacity(), 16);
        assert_eq!(arena.slice(0..8), b"abcdefgh");
    }

    #[test]
    fn growth_past_limit_leaves_arena_untouched() {
        let mut arena = ByteArena::new(16, 32).unwrap();
        arena.bump(16);
        let err = arena.ensure_capacity(33).unwrap_err();
        assert!(matches!(err, ArenaError::CapacityExhausted { .. }));
        assert_eq!(arena.capacity(), 16);
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn oversized_reservation_reports_allocation_failure() {
        let mut arena = ByteArena::new(0, usize::MAX).unwrap();
        let err = arena.ensure_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, ArenaError::AllocationFailed { .. }));
        assert_eq!(arena.capacity(), 0);
    }

    #[test]
    fn move_bytes_handles_overlap() {
        let mut arena = ByteArena::new(8, 8).unwrap();
        arena.bump(8);
        arena.slice_mut(0..8).copy_from_slice(b"xxabcdef");
        arena.move_bytes(2, 6, 0);
        assert_eq!(arena.slice(0..6), b"abcdef");
    }

    #[test]
    fn restore_capacity_never_cuts_used_bytes() {
        let mut arena = ByteArena::new(8, 64).unwrap();
        arena.bump(8);
        arena.ensure_capacity(32).unwrap();
        arena.restore_capacity(4);
        assert_eq!(arena.capacity(), 32);
        arena.restore_capacity(8);
        assert_eq!(arena.capacity(), 8);
    }
}

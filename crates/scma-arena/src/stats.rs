//! Occupancy statistics and per-block debug listings.

use std::fmt;

use scma_core::{Generation, Handle};

/// Point-in-time occupancy of an arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ArenaStats {
    /// Arena capacity in bytes.
    pub capacity: usize,
    /// Bytes covered by placed blocks, live or freed.
    pub used_size: usize,
    /// Bytes belonging to live blocks.
    pub live_bytes: usize,
    /// Bytes a compaction would give back (`used_size - live_bytes`).
    pub reclaimable_bytes: usize,
    /// Slots ever issued.
    pub block_count: usize,
    /// Slots currently in use.
    pub live_blocks: usize,
    /// Block records the table holds without growing.
    pub block_capacity: usize,
}

impl fmt::Display for ArenaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blocks={} live={} used={} live_bytes={} capacity={}",
            self.block_count, self.live_blocks, self.used_size, self.live_bytes, self.capacity
        )
    }
}

/// One row of a block table listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockInfo {
    /// Slot index.
    pub index: u32,
    /// Byte offset in the arena.
    pub offset: usize,
    /// Payload size in bytes.
    pub size: usize,
    /// Whether the slot is live.
    pub in_use: bool,
    /// Current generation of the slot.
    pub generation: Generation,
}

impl BlockInfo {
    /// The handle that currently resolves to this slot, if it is live.
    pub fn handle(&self) -> Option<Handle> {
        self.in_use.then(|| Handle::new(self.index, self.generation))
    }
}

impl fmt::Display for BlockInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] offset={} size={} in_use={} generation={}",
            self.index, self.offset, self.size, self.in_use, self.generation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_display() {
        let stats = ArenaStats {
            capacity: 64,
            used_size: 40,
            live_bytes: 32,
            reclaimable_bytes: 8,
            block_count: 3,
            live_blocks: 2,
            block_capacity: 4,
        };
        assert_eq!(
            stats.to_string(),
            "blocks=3 live=2 used=40 live_bytes=32 capacity=64"
        );
    }

    #[test]
    fn freed_block_has_no_handle() {
        let info = BlockInfo {
            index: 1,
            offset: 0,
            size: 4,
            in_use: false,
            generation: Generation(3),
        };
        assert_eq!(info.handle(), None);
        let live = BlockInfo { in_use: true, ..info };
        assert_eq!(live.handle(), Some(Handle::new(1, Generation(3))));
    }
}

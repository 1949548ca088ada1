//! The unlocked allocator core.
//!
//! [`CompactingArena`] owns the byte arena and the block table and
//! implements every allocator operation behind `&mut self`. The borrow
//! checker stands in for the lock here: a slice returned by
//! [`CompactingArena::resolve`] cannot outlive the next mutating call. For
//! shared, multi-threaded use wrap it in [`Allocator`](crate::Allocator).
//!
//! ```text
//! CompactingArena
//! ├── ByteArena   (Vec<u8>, bump cursor `used`)
//! ├── BlockTable  (Vec<Block> + free list, handle index space)
//! └── live_bytes  (sum of live block sizes)
//! ```

use std::ops::Range;

use scma_core::{Generation, Handle};

use crate::bytes::ByteArena;
use crate::compact::{compact, CompactionReport};
use crate::config::{ArenaConfig, CompactionPolicy};
use crate::error::ArenaError;
use crate::stats::{ArenaStats, BlockInfo};
use crate::table::BlockTable;

/// Single-owner compacting arena addressed through generational handles.
pub struct CompactingArena {
    bytes: ByteArena,
    table: BlockTable,
    /// Sum of the sizes of in-use blocks.
    live_bytes: usize,
    config: ArenaConfig,
}

impl CompactingArena {
    /// Create an arena with the given configuration.
    ///
    /// Reserves `initial_capacity` bytes and `initial_blocks` records; both
    /// may be zero.
    pub fn new(config: ArenaConfig) -> Result<Self, ArenaError> {
        Self::with_retired(config, Vec::new())
    }

    /// Create an arena whose slots continue the generations in `retired`.
    ///
    /// Pass the result of [`CompactingArena::retire`] from a previous arena
    /// to keep that arena's handles from validating against this one.
    pub fn with_retired(config: ArenaConfig, retired: Vec<Generation>) -> Result<Self, ArenaError> {
        config.validate()?;
        let bytes = ByteArena::new(config.initial_capacity, config.max_capacity)?;
        let table =
            BlockTable::new(config.initial_blocks, config.max_blocks)?.with_retired(retired);
        Ok(Self {
            bytes,
            table,
            live_bytes: 0,
            config,
        })
    }

    /// Allocate `size` zeroed bytes and return a handle to them.
    ///
    /// Reuses a freed slot (advancing its generation) or appends one. The
    /// block is placed at the arena cursor. On any failure the arena, the
    /// table and every outstanding handle are exactly as before.
    pub fn allocate(&mut self, size: usize) -> Result<Handle, ArenaError> {
        if size == 0 {
            return Err(ArenaError::ZeroSize);
        }
        let compact_first = self.config.compaction == CompactionPolicy::OnAllocate;
        let base = if compact_first {
            self.live_bytes
        } else {
            self.bytes.used()
        };
        let required = base.checked_add(size).ok_or(ArenaError::CapacityExhausted {
            requested: usize::MAX,
            limit: self.bytes.limit(),
        })?;

        let old_capacity = self.bytes.capacity();
        self.bytes.ensure_capacity(required)?;
        if !self.table.has_free_slot() {
            if let Err(err) = self.table.ensure_capacity(self.table.len() + 1) {
                self.bytes.restore_capacity(old_capacity);
                return Err(err);
            }
        }

        if compact_first {
            compact(&mut self.table, &mut self.bytes);
        }
        let offset = self.bytes.bump(size);
        let handle = self.table.issue(offset, size);
        self.live_bytes += size;
        tracing::trace!(
            index = handle.index(),
            generation = handle.generation().0,
            offset,
            size,
            "block allocated"
        );
        Ok(handle)
    }

    /// Free the block behind `handle`.
    ///
    /// The slot's generation is not advanced; the cleared in-use flag alone
    /// rejects the handle until the slot is reused. The bytes stay in place
    /// until the next compaction.
    pub fn free(&mut self, handle: Handle) -> Result<(), ArenaError> {
        let index = self.table.locate(handle)?;
        let size = self.table.get(index).map_or(0, |b| b.size);
        self.table.release(index);
        self.live_bytes -= size;
        tracing::trace!(index, generation = handle.generation().0, size, "block freed");
        Ok(())
    }

    /// Borrow the bytes behind `handle`.
    pub fn resolve(&self, handle: Handle) -> Result<&[u8], ArenaError> {
        let range = self.byte_range(handle)?;
        Ok(self.bytes.slice(range))
    }

    /// Mutably borrow the bytes behind `handle`.
    pub fn resolve_mut(&mut self, handle: Handle) -> Result<&mut [u8], ArenaError> {
        let range = self.byte_range(handle)?;
        Ok(self.bytes.slice_mut(range))
    }

    /// Arena byte range currently occupied by `handle`'s block.
    pub fn byte_range(&self, handle: Handle) -> Result<Range<usize>, ArenaError> {
        let block = self.table.validate(handle)?;
        Ok(block.offset..block.end())
    }

    /// Slide all live blocks toward offset 0 in index order.
    ///
    /// Handles are unchanged; only offsets move. Idempotent.
    pub fn compact(&mut self) -> CompactionReport {
        compact(&mut self.table, &mut self.bytes)
    }

    /// Whether `handle` names a live block.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.table.locate(handle).is_ok()
    }

    /// Size in bytes of the block behind `handle`.
    pub fn size_of(&self, handle: Handle) -> Result<usize, ArenaError> {
        self.table.validate(handle).map(|b| b.size)
    }

    /// Copy `src` into the block at `offset`.
    pub fn write(&mut self, handle: Handle, offset: usize, src: &[u8]) -> Result<(), ArenaError> {
        let range = self.sub_range(handle, offset, src.len())?;
        self.bytes.slice_mut(range).copy_from_slice(src);
        Ok(())
    }

    /// Copy bytes from the block at `offset` into `dst`.
    pub fn read(&self, handle: Handle, offset: usize, dst: &mut [u8]) -> Result<(), ArenaError> {
        let range = self.sub_range(handle, offset, dst.len())?;
        dst.copy_from_slice(self.bytes.slice(range));
        Ok(())
    }

    /// Owned copy of the block's bytes, unaffected by later moves.
    pub fn snapshot(&self, handle: Handle) -> Result<Vec<u8>, ArenaError> {
        self.resolve(handle).map(<[u8]>::to_vec)
    }

    /// Move an allocation to a block of `new_size` bytes.
    ///
    /// Copies `min(old, new)` bytes into a freshly allocated block, then
    /// frees the old one; the returned handle replaces `handle`, which
    /// becomes stale. On failure `handle` remains valid and unchanged.
    pub fn reallocate(&mut self, handle: Handle, new_size: usize) -> Result<Handle, ArenaError> {
        self.table.locate(handle)?;
        let new_handle = self.allocate(new_size)?;
        // Re-read: allocate may have compacted.
        let old = self.byte_range(handle)?;
        let new = self.byte_range(new_handle)?;
        let len = old.len().min(new.len());
        self.bytes.move_bytes(old.start, len, new.start);
        self.free(handle)?;
        Ok(new_handle)
    }

    /// Current occupancy.
    pub fn stats(&self) -> ArenaStats {
        let live_blocks = self.table.len() - self.table.free_count();
        ArenaStats {
            capacity: self.bytes.capacity(),
            used_size: self.bytes.used(),
            live_bytes: self.live_bytes,
            reclaimable_bytes: self.bytes.used() - self.live_bytes,
            block_count: self.table.len(),
            live_blocks,
            block_capacity: self.table.capacity(),
        }
    }

    /// Listing of every slot in index order.
    pub fn blocks(&self) -> Vec<BlockInfo> {
        self.table
            .iter()
            .enumerate()
            .map(|(index, b)| BlockInfo {
                index: index as u32,
                offset: b.offset,
                size: b.size,
                in_use: b.in_use,
                generation: b.generation,
            })
            .collect()
    }

    /// Listing row for a live handle.
    pub fn block_info(&self, handle: Handle) -> Result<BlockInfo, ArenaError> {
        let block = self.table.validate(handle)?;
        Ok(BlockInfo {
            index: handle.index(),
            offset: block.offset,
            size: block.size,
            in_use: true,
            generation: block.generation,
        })
    }

    /// Bytes covered by placed blocks (live or awaiting compaction).
    pub fn used_size(&self) -> usize {
        self.bytes.used()
    }

    /// Arena capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// The configuration this arena was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Release the storage, keeping only each slot's last generation.
    pub fn retire(self) -> Vec<Generation> {
        self.table.retire()
    }

    /// Emit the stats and every slot as `tracing` debug events.
    pub fn debug_dump(&self) {
        tracing::debug!(stats = %self.stats(), "arena state");
        for info in self.blocks() {
            tracing::debug!(block = %info, "arena block");
        }
    }

    fn sub_range(
        &self,
        handle: Handle,
        offset: usize,
        len: usize,
    ) -> Result<Range<usize>, ArenaError> {
        let block = self.table.validate(handle)?;
        if offset > block.size || len > block.size - offset {
            return Err(ArenaError::OutOfRange {
                offset,
                len,
                size: block.size,
            });
        }
        let start = block.offset + offset;
        Ok(start..start + len)
    }
}

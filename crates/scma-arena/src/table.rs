//! Block metadata and the block table.
//!
//! A [`Block`] records where one allocation lives in the byte arena. The
//! [`BlockTable`] is the slot array handles index into; freed slots are kept
//! (their generation intact) and handed out again by later allocations.

use scma_core::{Generation, Handle, Rejection};

use crate::error::ArenaError;
use crate::growth::grown_capacity;

/// Metadata for one allocation slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Byte offset in the arena. Rewritten only by compaction.
    pub offset: usize,
    /// Payload size in bytes. Fixed at allocation.
    pub size: usize,
    /// Whether the slot currently backs a live allocation.
    pub in_use: bool,
    /// Generation of the slot's current (or last) allocation.
    pub generation: Generation,
}

impl Block {
    /// One past the last byte of this block.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Growable slot array with a free list.
///
/// The logical `capacity` is tracked separately from the entry count and
/// grows with the same doubling policy as the byte arena. The free list is
/// reserved alongside the slots, so freeing never allocates.
pub struct BlockTable {
    blocks: Vec<Block>,
    /// Indices of slots that are not in use, most recently freed last.
    free: Vec<u32>,
    /// Last generation of each slot in a previous table over the same
    /// handle space. Slots appended here continue past these.
    retired: Vec<Generation>,
    capacity: usize,
    limit: usize,
}

impl BlockTable {
    /// Create a table with room for `capacity` records.
    pub fn new(capacity: usize, limit: usize) -> Result<Self, ArenaError> {
        let mut table = Self {
            blocks: Vec::new(),
            free: Vec::new(),
            retired: Vec::new(),
            capacity: 0,
            limit,
        };
        table.ensure_capacity(capacity)?;
        Ok(table)
    }

    /// Continue the generations of a previous table.
    ///
    /// A slot appended at index `i` starts at `retired[i].next()` instead of
    /// [`Generation::FIRST`], so handles minted by the previous table never
    /// validate here.
    pub fn with_retired(mut self, retired: Vec<Generation>) -> Self {
        self.retired = retired;
        self
    }

    /// Per-slot generations to hand to a successor table.
    ///
    /// Covers every slot this table or its predecessors ever issued.
    pub fn retire(self) -> Vec<Generation> {
        let mut generations = self.retired;
        for (index, block) in self.blocks.iter().enumerate() {
            match generations.get_mut(index) {
                Some(slot) => *slot = block.generation,
                None => generations.push(block.generation),
            }
        }
        generations
    }

    /// Grow so that at least `required` records fit.
    ///
    /// No-op if already large enough; on failure nothing changes.
    pub fn ensure_capacity(&mut self, required: usize) -> Result<(), ArenaError> {
        let Some(new_capacity) = grown_capacity(self.capacity, required, self.limit)? else {
            return Ok(());
        };
        let failed = |_| ArenaError::AllocationFailed {
            requested: new_capacity,
        };
        self.free
            .try_reserve_exact(new_capacity - self.free.len())
            .map_err(failed)?;
        self.blocks
            .try_reserve_exact(new_capacity - self.blocks.len())
            .map_err(failed)?;
        self.capacity = new_capacity;
        tracing::debug!(capacity = new_capacity, required, "block table grown");
        Ok(())
    }

    /// Check a handle against the table and return its slot index.
    ///
    /// Rejects the sentinel, an out-of-range index, a freed slot, or a
    /// generation mismatch. O(1).
    pub fn locate(&self, handle: Handle) -> Result<usize, ArenaError> {
        if handle.is_sentinel() {
            return Err(ArenaError::MalformedHandle { handle });
        }
        let index = handle.index() as usize;
        let reject = |rejection| ArenaError::InvalidHandle { handle, rejection };
        let block = self
            .blocks
            .get(index)
            .ok_or_else(|| reject(Rejection::IndexOutOfRange))?;
        if !block.in_use {
            return Err(reject(Rejection::Freed));
        }
        if block.generation != handle.generation() {
            return Err(reject(Rejection::GenerationMismatch));
        }
        Ok(index)
    }

    /// Validate a handle and return its block.
    pub fn validate(&self, handle: Handle) -> Result<&Block, ArenaError> {
        self.locate(handle).map(|index| &self.blocks[index])
    }

    /// Whether a freed slot is available for reuse.
    pub fn has_free_slot(&self) -> bool {
        !self.free.is_empty()
    }

    /// Issue a slot for a new allocation at `offset`.
    ///
    /// Reuses the most recently freed slot if there is one, advancing its
    /// generation once; otherwise appends. The caller must have ensured
    /// capacity for `len() + 1` records when no slot is free.
    pub(crate) fn issue(&mut self, offset: usize, size: usize) -> Handle {
        let index = match self.free.pop() {
            Some(index) => index as usize,
            None => {
                debug_assert!(self.blocks.len() < self.capacity);
                let index = self.blocks.len();
                let generation = self.retired.get(index).copied().unwrap_or(Generation::NONE);
                self.blocks.push(Block {
                    offset: 0,
                    size: 0,
                    in_use: false,
                    generation,
                });
                index
            }
        };
        let block = &mut self.blocks[index];
        block.offset = offset;
        block.size = size;
        block.in_use = true;
        block.generation = block.generation.next();
        Handle::new(index as u32, block.generation)
    }

    /// Mark a validated slot as free. The generation is left unchanged.
    pub(crate) fn release(&mut self, index: usize) {
        self.blocks[index].in_use = false;
        self.free.push(index as u32);
    }

    /// The block at `index`, live or not.
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    /// Iterate all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    /// Number of slots ever issued (live + freed).
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no slot has been issued yet.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Number of freed slots awaiting reuse.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Records the table can hold without growing.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

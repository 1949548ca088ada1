//! Full-arena compaction.
//!
//! Walks the block table in index order and slides every live block down
//! to a running offset, abandoning the bytes of freed blocks. Handles are
//! untouched: only `Block::offset` and the arena cursor change.

use crate::bytes::ByteArena;
use crate::table::{Block, BlockTable};

/// What a compaction pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompactionReport {
    /// Live blocks whose offset changed.
    pub moved_blocks: usize,
    /// Payload bytes copied.
    pub moved_bytes: usize,
    /// Decrease of the arena cursor.
    pub reclaimed_bytes: usize,
}

/// Compact `bytes` according to the offsets in `table`.
///
/// Index order is not offset order once slots are reused, so the running
/// offset can overtake a live block that has not moved yet. When that would
/// happen, a staging pass first restores index order == offset order; after
/// it every move is downward and never clobbers an unmoved block.
pub(crate) fn compact(table: &mut BlockTable, bytes: &mut ByteArena) -> CompactionReport {
    let before = bytes.used();
    let mut report = CompactionReport::default();

    if needs_staging(table) {
        stage_out_of_order(table, bytes, &mut report);
    }

    let mut new_offset = 0usize;
    for block in table.iter_mut().filter(|b| b.in_use) {
        if block.offset != new_offset {
            debug_assert!(new_offset < block.offset);
            bytes.move_bytes(block.offset, block.size, new_offset);
            block.offset = new_offset;
            report.moved_blocks += 1;
            report.moved_bytes += block.size;
        }
        new_offset += block.size;
    }
    bytes.set_used(new_offset);
    report.reclaimed_bytes = before.saturating_sub(new_offset);

    tracing::debug!(
        moved_blocks = report.moved_blocks,
        moved_bytes = report.moved_bytes,
        reclaimed_bytes = report.reclaimed_bytes,
        used = new_offset,
        "arena compacted"
    );
    report
}

/// Whether the index-order walk would move some block upward.
fn needs_staging(table: &BlockTable) -> bool {
    let mut new_offset = 0usize;
    for block in table.iter().filter(|b| b.in_use) {
        if block.offset < new_offset {
            return true;
        }
        new_offset += block.size;
    }
    false
}

/// Pack live blocks in offset order (always a downward move), then permute
/// the packed region into index order through a scratch copy.
///
/// The order list and the scratch buffer are reserved fallibly. If either
/// reservation fails, [`rotate_into_index_order`] does the job in place.
fn stage_out_of_order(
    table: &mut BlockTable,
    bytes: &mut ByteArena,
    report: &mut CompactionReport,
) {
    let live_blocks = table.iter().filter(|b| b.in_use).count();
    let live: usize = table.iter().filter(|b| b.in_use).map(|b| b.size).sum();
    let mut order: Vec<usize> = Vec::new();
    let mut scratch: Vec<u8> = Vec::new();
    if order.try_reserve_exact(live_blocks).is_err() || scratch.try_reserve_exact(live).is_err() {
        tracing::debug!(live, "compaction scratch unavailable, rotating in place");
        rotate_into_index_order(table, bytes, report);
        return;
    }

    order.extend((0..table.len()).filter(|&i| table.get(i).is_some_and(|b| b.in_use)));
    order.sort_by_key(|&i| table.get(i).map_or(0, |b| b.offset));

    // Pack in offset order: every move is downward.
    let mut cursor = 0usize;
    for &index in &order {
        let Some(block) = table.get_mut(index) else {
            continue;
        };
        if block.offset != cursor {
            bytes.move_bytes(block.offset, block.size, cursor);
            block.offset = cursor;
            report.moved_blocks += 1;
            report.moved_bytes += block.size;
        }
        cursor += block.size;
    }
    debug_assert_eq!(cursor, live);

    // Rotate into index order through a scratch copy of the packed region.
    scratch.extend_from_slice(bytes.slice(0..live));
    let mut new_offset = 0usize;
    for block in table.iter_mut().filter(|b| b.in_use) {
        let src = block.offset;
        bytes
            .slice_mut(new_offset..new_offset + block.size)
            .copy_from_slice(&scratch[src..src + block.size]);
        if src != new_offset {
            report.moved_bytes += block.size;
        }
        block.offset = new_offset;
        new_offset += block.size;
    }
}

/// Place live blocks in index order without any extra memory.
///
/// Blocks not yet placed always lie at or above the cursor. Each block in
/// turn is brought down to the cursor by rotating the span between them,
/// which shifts the bytes it passes (garbage or later blocks) up by its
/// size. Quadratic in the worst case.
fn rotate_into_index_order(
    table: &mut BlockTable,
    bytes: &mut ByteArena,
    report: &mut CompactionReport,
) {
    let mut cursor = 0usize;
    for index in 0..table.len() {
        let Some(&Block {
            offset,
            size,
            in_use: true,
            ..
        }) = table.get(index)
        else {
            continue;
        };
        if offset != cursor {
            debug_assert!(offset > cursor);
            bytes.slice_mut(cursor..offset + size).rotate_right(size);
            for later in table.iter_mut().skip(index + 1) {
                if later.in_use && (cursor..offset).contains(&later.offset) {
                    later.offset += size;
                }
            }
            if let Some(block) = table.get_mut(index) {
                block.offset = cursor;
            }
            report.moved_blocks += 1;
            report.moved_bytes += size;
        }
        cursor += size;
    }
}

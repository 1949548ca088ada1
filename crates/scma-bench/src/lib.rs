//! Benchmark profiles for the SCMA allocator.
//!
//! - [`small_objects`]: many short-lived blocks of 8–64 bytes
//! - [`mixed_sizes`]: a wider spread up to 4 KiB
//! - [`fragmented`]: a populated allocator with every other block freed

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scma_arena::{Allocator, ArenaConfig, ArenaError, Handle};

/// Block sizes for a small-object workload.
pub fn small_objects(count: usize, seed: u64) -> Vec<usize> {
    sizes(count, seed, 8, 64)
}

/// Block sizes spread between 16 bytes and 4 KiB.
pub fn mixed_sizes(count: usize, seed: u64) -> Vec<usize> {
    sizes(count, seed, 16, 4096)
}

/// Allocate every size in `sizes`, then free every other block.
///
/// Returns the allocator and the surviving handles. The arena is left
/// half reclaimable, which is the starting point of the compaction
/// benchmarks.
pub fn fragmented(sizes: &[usize]) -> Result<(Allocator, Vec<Handle>), ArenaError> {
    let total: usize = sizes.iter().sum();
    let alloc = Allocator::with_config(ArenaConfig::new(total).with_initial_blocks(sizes.len()))?;
    let mut survivors = Vec::with_capacity(sizes.len() / 2 + 1);
    for (i, &size) in sizes.iter().enumerate() {
        let handle = alloc.allocate(size)?;
        if i % 2 == 0 {
            survivors.push(handle);
        } else {
            alloc.free(handle)?;
        }
    }
    Ok((alloc, survivors))
}

fn sizes(count: usize, seed: u64, min: usize, max: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let span = max - min + 1;
    (0..count)
        .map(|_| min + rng.next_u32() as usize % span)
        .collect()
}

//! Reusable allocator fixtures.
//!
//! - [`pattern`] generates the bytes a block is expected to hold.
//! - [`fill_blocks`] allocates and stamps a batch of blocks.
//! - [`Churn`] drives a seeded allocate/free/compact workload and keeps a
//!   shadow copy of every live block for verification.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scma_arena::{Allocator, ArenaConfig, ArenaError};
use scma_core::Handle;

/// Deterministic bytes for a block tagged `seed`.
///
/// Neighbouring seeds differ in every position, so a block that was moved
/// on top of another one is caught by a plain comparison.
pub fn pattern(seed: u32, len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (seed as usize).wrapping_mul(31).wrapping_add(i * 7) as u8 ^ 0xA5)
        .collect()
}

/// A live block together with the bytes it should contain.
#[derive(Clone, Debug)]
pub struct LiveBlock {
    pub handle: Handle,
    pub expected: Vec<u8>,
}

/// Allocate one block per entry of `sizes` and stamp each with its pattern.
pub fn fill_blocks(alloc: &Allocator, sizes: &[usize]) -> Result<Vec<LiveBlock>, ArenaError> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| {
            let handle = alloc.allocate(size)?;
            let expected = pattern(i as u32, size);
            alloc.write(handle, 0, &expected)?;
            Ok(LiveBlock { handle, expected })
        })
        .collect()
}

/// Panic unless every block still holds its expected bytes.
pub fn assert_contents(alloc: &Allocator, blocks: &[LiveBlock]) {
    for block in blocks {
        let view = alloc
            .resolve(block.handle)
            .unwrap_or_else(|e| panic!("{} no longer resolves: {e}", block.handle));
        assert_eq!(
            &*view,
            block.expected.as_slice(),
            "contents of {} changed",
            block.handle
        );
    }
}

/// Configuration whose arena can never exceed `max_capacity` bytes.
pub fn tight_config(max_capacity: usize) -> ArenaConfig {
    ArenaConfig::new(0).with_max_capacity(max_capacity)
}

/// Counters collected by a [`Churn`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChurnReport {
    pub allocations: usize,
    pub frees: usize,
    pub compactions: usize,
    pub rejected: usize,
}

/// Seeded allocate/free/compact workload with a shadow copy of live data.
pub struct Churn {
    rng: ChaCha8Rng,
    live: Vec<LiveBlock>,
    stale: Vec<Handle>,
    max_size: usize,
    tag: u32,
}

impl Churn {
    /// A workload drawing block sizes from `1..=max_size`.
    pub fn new(seed: u64, max_size: usize) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            live: Vec::new(),
            stale: Vec::new(),
            max_size: max_size.max(1),
            tag: 0,
        }
    }

    /// Run `steps` random operations against `alloc`.
    ///
    /// Capacity errors are counted in [`ChurnReport::rejected`]; any other
    /// error is returned.
    pub fn run(&mut self, alloc: &Allocator, steps: usize) -> Result<ChurnReport, ArenaError> {
        let mut report = ChurnReport::default();
        for _ in 0..steps {
            match self.rng.next_u32() % 8 {
                0..=3 => {
                    let size = 1 + (self.rng.next_u32() as usize % self.max_size);
                    match alloc.allocate(size) {
                        Ok(handle) => {
                            self.tag = self.tag.wrapping_add(1);
                            let expected = pattern(self.tag, size);
                            alloc.write(handle, 0, &expected)?;
                            self.live.push(LiveBlock { handle, expected });
                            report.allocations += 1;
                        }
                        Err(ArenaError::CapacityExhausted { .. }) => report.rejected += 1,
                        Err(e) => return Err(e),
                    }
                }
                4..=6 if !self.live.is_empty() => {
                    let pick = self.rng.next_u32() as usize % self.live.len();
                    let block = self.live.swap_remove(pick);
                    alloc.free(block.handle)?;
                    self.stale.push(block.handle);
                    report.frees += 1;
                }
                4..=6 => {}
                _ => {
                    alloc.compact()?;
                    report.compactions += 1;
                }
            }
        }
        Ok(report)
    }

    /// Blocks the workload believes are live.
    pub fn live(&self) -> &[LiveBlock] {
        &self.live
    }

    /// Handles the workload has freed.
    pub fn stale(&self) -> &[Handle] {
        &self.stale
    }

    /// Sum of the sizes of live blocks.
    pub fn live_bytes(&self) -> usize {
        self.live.iter().map(|b| b.expected.len()).sum()
    }

    /// Check every live block's bytes and that no stale handle resolves.
    pub fn verify(&self, alloc: &Allocator) {
        assert_contents(alloc, &self.live);
        for &handle in &self.stale {
            assert!(!alloc.is_valid(handle), "stale {handle} still resolves");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_deterministic_and_seed_dependent() {
        assert_eq!(pattern(3, 16), pattern(3, 16));
        assert_ne!(pattern(3, 16), pattern(4, 16));
        assert_eq!(pattern(9, 0), Vec::<u8>::new());
    }

    #[test]
    fn churn_is_reproducible() {
        let a = Allocator::with_config(ArenaConfig::default()).unwrap();
        let b = Allocator::with_config(ArenaConfig::default()).unwrap();
        let ra = Churn::new(7, 32).run(&a, 200).unwrap();
        let rb = Churn::new(7, 32).run(&b, 200).unwrap();
        assert_eq!(ra, rb);
        assert_eq!(a.stats().unwrap(), b.stats().unwrap());
    }

    #[test]
    fn churn_keeps_shadow_in_sync() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        let mut churn = Churn::new(11, 48);
        churn.run(&alloc, 300).unwrap();
        churn.verify(&alloc);
        assert_eq!(alloc.stats().unwrap().live_bytes, churn.live_bytes());
    }
}

//! Arena configuration parameters.

use crate::error::ArenaError;
use crate::table::Block;

/// When the arena compacts on its own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompactionPolicy {
    /// Only explicit `compact()` calls move blocks.
    #[default]
    Manual,
    /// Compact before placing every allocation.
    ///
    /// Keeps `used_size` equal to the live byte count after each
    /// allocation, at the cost of a full table scan per call.
    OnAllocate,
}

/// Configuration for the compacting arena.
///
/// Validated at construction; all values are immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArenaConfig {
    /// Arena bytes reserved up front. Zero defers to the first allocation.
    pub initial_capacity: usize,

    /// Block records reserved up front. Zero defers to the first allocation.
    pub initial_blocks: usize,

    /// Upper bound on arena bytes.
    ///
    /// Default: [`ArenaConfig::PLATFORM_MAX_BYTES`]. Lowering it makes
    /// growth fail with `CapacityExhausted` before the platform would.
    pub max_capacity: usize,

    /// Upper bound on block records (and therefore live handles).
    ///
    /// Default: [`ArenaConfig::PLATFORM_MAX_BLOCKS`].
    pub max_blocks: usize,

    /// Automatic compaction behaviour.
    pub compaction: CompactionPolicy,
}

impl ArenaConfig {
    /// Largest byte buffer a `Vec<u8>` can hold.
    pub const PLATFORM_MAX_BYTES: usize = isize::MAX as usize;

    /// Largest block table addressable by a handle index.
    ///
    /// Index `u32::MAX` is the sentinel, so at most `u32::MAX` slots exist.
    /// On 32-bit targets the allocation size limit binds first.
    pub const PLATFORM_MAX_BLOCKS: usize = {
        let by_index = u32::MAX as usize;
        let by_bytes = isize::MAX as usize / std::mem::size_of::<Block>();
        if by_index < by_bytes {
            by_index
        } else {
            by_bytes
        }
    };

    /// Create a config reserving `initial_capacity` arena bytes.
    ///
    /// Uses defaults for everything else.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            ..Self::default()
        }
    }

    /// Set the number of block records reserved up front.
    pub fn with_initial_blocks(mut self, initial_blocks: usize) -> Self {
        self.initial_blocks = initial_blocks;
        self
    }

    /// Cap arena growth at `max_capacity` bytes.
    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity.min(Self::PLATFORM_MAX_BYTES);
        self
    }

    /// Cap the block table at `max_blocks` records.
    pub fn with_max_blocks(mut self, max_blocks: usize) -> Self {
        self.max_blocks = max_blocks.min(Self::PLATFORM_MAX_BLOCKS);
        self
    }

    /// Select the compaction policy.
    pub fn with_compaction(mut self, compaction: CompactionPolicy) -> Self {
        self.compaction = compaction;
        self
    }

    /// Check that the initial reservations fit under their limits.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.max_capacity > Self::PLATFORM_MAX_BYTES {
            return Err(ArenaError::CapacityExhausted {
                requested: self.max_capacity,
                limit: Self::PLATFORM_MAX_BYTES,
            });
        }
        if self.max_blocks > Self::PLATFORM_MAX_BLOCKS {
            return Err(ArenaError::CapacityExhausted {
                requested: self.max_blocks,
                limit: Self::PLATFORM_MAX_BLOCKS,
            });
        }
        if self.initial_capacity > self.max_capacity {
            return Err(ArenaError::CapacityExhausted {
                requested: self.initial_capacity,
                limit: self.max_capacity,
            });
        }
        if self.initial_blocks > self.max_blocks {
            return Err(ArenaError::CapacityExhausted {
                requested: self.initial_blocks,
                limit: self.max_blocks,
            });
        }
        Ok(())
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            initial_blocks: 0,
            max_capacity: Self::PLATFORM_MAX_BYTES,
            max_blocks: Self::PLATFORM_MAX_BLOCKS,
            compaction: CompactionPolicy::Manual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_lazy_and_unbounded() {
        let config = ArenaConfig::default();
        assert_eq!(config.initial_capacity, 0);
        assert_eq!(config.initial_blocks, 0);
        assert_eq!(config.max_capacity, ArenaConfig::PLATFORM_MAX_BYTES);
        assert_eq!(config.compaction, CompactionPolicy::Manual);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn initial_capacity_preserved() {
        let config = ArenaConfig::new(4096).with_initial_blocks(8);
        assert_eq!(config.initial_capacity, 4096);
        assert_eq!(config.initial_blocks, 8);
    }

    #[test]
    fn initial_above_limit_rejected() {
        let config = ArenaConfig::new(128).with_max_capacity(64);
        assert!(matches!(
            config.validate(),
            Err(ArenaError::CapacityExhausted {
                requested: 128,
                limit: 64
            })
        ));
        let config = ArenaConfig::default()
            .with_initial_blocks(4)
            .with_max_blocks(2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn limits_clamped_to_platform() {
        let config = ArenaConfig::default().with_max_blocks(usize::MAX);
        assert_eq!(config.max_blocks, ArenaConfig::PLATFORM_MAX_BLOCKS);
    }
}

//! The shared, lock-guarded allocator.
//!
//! [`Allocator`] wraps a [`CompactingArena`] in a single `parking_lot`
//! mutex. Every operation, resolution included, takes that one lock, so all
//! calls from all threads are totally ordered and a compaction can never
//! run while another caller is looking at a block's bytes.
//!
//! The allocator also carries the lifecycle flag: it starts uninitialized,
//! becomes usable after [`Allocator::initialize`], and returns to the
//! uninitialized state on [`Allocator::shutdown`]. Calls made while
//! uninitialized fail with [`ArenaError::NotInitialized`]. Slot generations
//! outlive a shutdown, so a handle from an earlier lifetime never validates
//! after the allocator is initialized again.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use scma_core::{Generation, Handle};

use crate::arena::CompactingArena;
use crate::compact::CompactionReport;
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::stats::{ArenaStats, BlockInfo};

/// Locked view of a block's bytes, returned by [`Allocator::resolve`].
///
/// The allocator lock is held for as long as the view lives. Drop it
/// before making any other call on the same allocator: the lock is not
/// reentrant, so a nested call from the same thread deadlocks.
pub type BlockGuard<'a> = MappedMutexGuard<'a, [u8]>;

/// Thread-safe compacting allocator with an explicit lifecycle.
///
/// Share it by reference or through an `Arc`; it is `Send + Sync`.
pub struct Allocator {
    state: Mutex<State>,
}

struct State {
    /// The live arena; `None` while uninitialized.
    arena: Option<CompactingArena>,
    /// Per-slot generations left by the last shut-down arena.
    retired: Vec<Generation>,
}

impl Allocator {
    /// Create an uninitialized allocator.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                arena: None,
                retired: Vec::new(),
            }),
        }
    }

    /// Create an allocator and initialize it with `config`.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        let allocator = Self::new();
        allocator.initialize(config)?;
        Ok(allocator)
    }

    /// Build the arena. Fails with `AlreadyInitialized` if it is live.
    pub fn initialize(&self, config: ArenaConfig) -> Result<(), ArenaError> {
        let mut state = self.state.lock();
        if state.arena.is_some() {
            return Err(ArenaError::AlreadyInitialized);
        }
        // A failed initialization must leave `retired` intact.
        let arena = CompactingArena::with_retired(config, state.retired.clone())?;
        tracing::debug!(
            capacity = arena.capacity(),
            compaction = ?arena.config().compaction,
            retired_slots = state.retired.len(),
            "allocator initialized"
        );
        state.retired = Vec::new();
        state.arena = Some(arena);
        Ok(())
    }

    /// Release all storage and return to the uninitialized state.
    ///
    /// Every outstanding handle becomes unusable, including after a later
    /// [`Allocator::initialize`]. Calling this on an uninitialized allocator
    /// does nothing.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if let Some(arena) = state.arena.take() {
            tracing::debug!(stats = %arena.stats(), "allocator shut down");
            state.retired = arena.retire();
        }
    }

    /// Whether the allocator has been initialized and not shut down.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().arena.is_some()
    }

    /// Allocate `size` zeroed bytes.
    pub fn allocate(&self, size: usize) -> Result<Handle, ArenaError> {
        self.with_arena(|arena| arena.allocate(size))
    }

    /// Free the block behind `handle`.
    pub fn free(&self, handle: Handle) -> Result<(), ArenaError> {
        self.with_arena(|arena| arena.free(handle))
    }

    /// Lock the allocator and return a view of the block's bytes.
    ///
    /// The view is only meaningful while it is held: once it is dropped,
    /// any later call may move or free the bytes.
    pub fn resolve(&self, handle: Handle) -> Result<BlockGuard<'_>, ArenaError> {
        let mut state = self.state.lock();
        let arena = state.arena.as_mut().ok_or(ArenaError::NotInitialized)?;
        arena.byte_range(handle)?;
        MutexGuard::try_map(state, |state| {
            state
                .arena
                .as_mut()
                .and_then(|arena| arena.resolve_mut(handle).ok())
        })
        .map_err(|_| ArenaError::NotInitialized)
    }

    /// Compact the arena.
    pub fn compact(&self) -> Result<CompactionReport, ArenaError> {
        self.with_arena(|arena| Ok(arena.compact()))
    }

    /// Whether `handle` names a live block. False when uninitialized.
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.state
            .lock()
            .arena
            .as_ref()
            .is_some_and(|arena| arena.is_valid(handle))
    }

    /// Size in bytes of the block behind `handle`.
    pub fn size_of(&self, handle: Handle) -> Result<usize, ArenaError> {
        self.with_arena(|arena| arena.size_of(handle))
    }

    /// Copy `src` into the block at `offset`.
    pub fn write(&self, handle: Handle, offset: usize, src: &[u8]) -> Result<(), ArenaError> {
        self.with_arena(|arena| arena.write(handle, offset, src))
    }

    /// Copy bytes from the block at `offset` into `dst`.
    pub fn read(&self, handle: Handle, offset: usize, dst: &mut [u8]) -> Result<(), ArenaError> {
        self.with_arena(|arena| arena.read(handle, offset, dst))
    }

    /// Owned copy of the block's bytes.
    pub fn snapshot(&self, handle: Handle) -> Result<Vec<u8>, ArenaError> {
        self.with_arena(|arena| arena.snapshot(handle))
    }

    /// Move an allocation to a block of `new_size` bytes.
    ///
    /// See [`CompactingArena::reallocate`].
    pub fn reallocate(&self, handle: Handle, new_size: usize) -> Result<Handle, ArenaError> {
        self.with_arena(|arena| arena.reallocate(handle, new_size))
    }

    /// Current occupancy.
    pub fn stats(&self) -> Result<ArenaStats, ArenaError> {
        self.with_arena(|arena| Ok(arena.stats()))
    }

    /// Listing of every slot in index order.
    pub fn blocks(&self) -> Result<Vec<BlockInfo>, ArenaError> {
        self.with_arena(|arena| Ok(arena.blocks()))
    }

    /// Listing row for a live handle.
    pub fn block_info(&self, handle: Handle) -> Result<BlockInfo, ArenaError> {
        self.with_arena(|arena| arena.block_info(handle))
    }

    /// Log the arena state at debug level.
    pub fn debug_dump(&self) {
        match self.state.lock().arena.as_ref() {
            Some(arena) => arena.debug_dump(),
            None => tracing::debug!("allocator not initialized"),
        }
    }

    /// Run `f` on the arena under the lock.
    ///
    /// Lets callers batch several operations into one critical section.
    pub fn with_arena<R>(
        &self,
        f: impl FnOnce(&mut CompactingArena) -> Result<R, ArenaError>,
    ) -> Result<R, ArenaError> {
        let mut state = self.state.lock();
        let arena = state.arena.as_mut().ok_or(ArenaError::NotInitialized)?;
        f(arena)
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn allocator_is_send_sync() {
        assert_send_sync::<Allocator>();
    }

    #[test]
    fn uninitialized_calls_fail_fast() {
        let alloc = Allocator::new();
        assert!(!alloc.is_initialized());
        assert_eq!(alloc.allocate(8), Err(ArenaError::NotInitialized));
        assert_eq!(alloc.compact(), Err(ArenaError::NotInitialized));
        assert!(matches!(
            alloc.resolve(Handle::INVALID),
            Err(ArenaError::NotInitialized)
        ));
        assert!(!alloc.is_valid(Handle::INVALID));
    }

    #[test]
    fn double_initialize_rejected() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        assert_eq!(
            alloc.initialize(ArenaConfig::default()),
            Err(ArenaError::AlreadyInitialized)
        );
    }

    #[test]
    fn shutdown_invalidates_everything() {
        let alloc = Allocator::with_config(ArenaConfig::new(64)).unwrap();
        let h = alloc.allocate(8).unwrap();
        alloc.shutdown();
        assert!(!alloc.is_initialized());
        assert_eq!(alloc.size_of(h), Err(ArenaError::NotInitialized));
        alloc.shutdown();

        alloc.initialize(ArenaConfig::default()).unwrap();
        assert!(!alloc.is_valid(h));
        assert_eq!(alloc.stats().unwrap(), ArenaStats::default());
    }

    #[test]
    fn handles_stay_dead_across_reinitialization() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        let old = alloc.allocate(8).unwrap();
        let reused = alloc.allocate(8).unwrap();
        alloc.free(reused).unwrap();
        let reused_again = alloc.allocate(8).unwrap();
        alloc.shutdown();

        alloc.initialize(ArenaConfig::default()).unwrap();
        let fresh: Vec<Handle> = (0..3).map(|_| alloc.allocate(8).unwrap()).collect();
        assert_eq!(fresh[0].index(), old.index());
        assert_eq!(fresh[1].index(), reused_again.index());
        for stale in [old, reused, reused_again] {
            assert!(!alloc.is_valid(stale), "{stale} came back to life");
            assert_eq!(
                alloc.resolve(stale).unwrap_err().rejection(),
                Some(scma_core::Rejection::GenerationMismatch)
            );
        }
        assert!(fresh.iter().all(|&h| alloc.is_valid(h)));

        // A second cycle keeps advancing past both earlier lifetimes.
        alloc.shutdown();
        alloc.initialize(ArenaConfig::default()).unwrap();
        let third = alloc.allocate(8).unwrap();
        assert!(!alloc.is_valid(fresh[0]));
        assert!(third.generation() > fresh[0].generation());
    }

    #[test]
    fn failed_initialize_keeps_retired_generations() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        let old = alloc.allocate(4).unwrap();
        alloc.shutdown();

        let bad = ArenaConfig::new(64).with_max_capacity(8);
        assert!(alloc.initialize(bad).is_err());
        assert!(!alloc.is_initialized());

        alloc.initialize(ArenaConfig::default()).unwrap();
        let _ = alloc.allocate(4).unwrap();
        assert!(!alloc.is_valid(old));
    }

    #[test]
    fn resolve_gives_writable_view() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        let h = alloc.allocate(4).unwrap();
        {
            let mut view = alloc.resolve(h).unwrap();
            view.copy_from_slice(b"lock");
        }
        assert_eq!(alloc.snapshot(h).unwrap(), b"lock");
    }

    #[test]
    fn resolve_reports_rejection() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        let h = alloc.allocate(4).unwrap();
        alloc.free(h).unwrap();
        let err = alloc.resolve(h).unwrap_err();
        assert_eq!(err.rejection(), Some(scma_core::Rejection::Freed));
    }

    #[test]
    fn with_arena_batches_operations() {
        let alloc = Allocator::with_config(ArenaConfig::default()).unwrap();
        let (a, b) = alloc
            .with_arena(|arena| Ok((arena.allocate(2)?, arena.allocate(3)?)))
            .unwrap();
        assert_eq!(alloc.size_of(a).unwrap(), 2);
        assert_eq!(alloc.size_of(b).unwrap(), 3);
    }
}

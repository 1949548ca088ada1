//! Typed element access over a handle.
//!
//! An [`Accessor`] reinterprets a block as an array of plain-old-data
//! values. Arena bytes carry no alignment guarantee, so every element is
//! copied in and out with `bytemuck`'s unaligned helpers; no reference into
//! the arena ever escapes the lock.

use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::Range;

use bytemuck::Pod;
use scma_core::Handle;

use crate::allocator::Allocator;
use crate::error::ArenaError;

/// Typed view of one allocation, revalidated on every access.
pub struct Accessor<'a, T: Pod> {
    allocator: &'a Allocator,
    handle: Handle,
    _marker: PhantomData<T>,
}

impl<'a, T: Pod> Accessor<'a, T> {
    /// An accessor bound to nothing.
    pub fn unbound(allocator: &'a Allocator) -> Self {
        Self {
            allocator,
            handle: Handle::INVALID,
            _marker: PhantomData,
        }
    }

    /// Bind to `handle`, which must currently be valid.
    pub fn new(allocator: &'a Allocator, handle: Handle) -> Result<Self, ArenaError> {
        let mut accessor = Self::unbound(allocator);
        accessor.bind(handle)?;
        Ok(accessor)
    }

    /// Allocate room for `count` elements and bind to the new block.
    pub fn allocate(allocator: &'a Allocator, count: usize) -> Result<Self, ArenaError> {
        let element = element_size::<T>(0)?;
        let size = count.checked_mul(element).ok_or(ArenaError::CapacityExhausted {
            requested: usize::MAX,
            limit: usize::MAX,
        })?;
        let handle = allocator.allocate(size)?;
        Ok(Self {
            allocator,
            handle,
            _marker: PhantomData,
        })
    }

    /// Rebind to `handle`. On failure the previous binding is kept.
    pub fn bind(&mut self, handle: Handle) -> Result<(), ArenaError> {
        self.allocator.size_of(handle)?;
        self.handle = handle;
        Ok(())
    }

    /// Whether a handle has been bound (it may since have gone stale).
    pub fn is_bound(&self) -> bool {
        !self.handle.is_sentinel()
    }

    /// The bound handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Number of whole elements that fit in the block.
    pub fn count(&self) -> Result<usize, ArenaError> {
        let size = self.allocator.size_of(self.handle)?;
        Ok(size / element_size::<T>(size)?)
    }

    /// Read the element at the start of the block.
    pub fn read(&self) -> Result<T, ArenaError> {
        self.read_at(0)
    }

    /// Overwrite the element at the start of the block.
    pub fn write(&self, value: &T) -> Result<(), ArenaError> {
        self.write_at(0, value)
    }

    /// Read element `index`.
    pub fn read_at(&self, index: usize) -> Result<T, ArenaError> {
        let view = self.allocator.resolve(self.handle)?;
        let range = element_range::<T>(index, view.len())?;
        Ok(bytemuck::pod_read_unaligned(&view[range]))
    }

    /// Overwrite element `index`.
    pub fn write_at(&self, index: usize, value: &T) -> Result<(), ArenaError> {
        let mut view = self.allocator.resolve(self.handle)?;
        let range = element_range::<T>(index, view.len())?;
        view[range].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    /// Read, modify and write back element `index` under one lock.
    pub fn update_at<R>(&self, index: usize, f: impl FnOnce(&mut T) -> R) -> Result<R, ArenaError> {
        let mut view = self.allocator.resolve(self.handle)?;
        let range = element_range::<T>(index, view.len())?;
        let mut value: T = bytemuck::pod_read_unaligned(&view[range.clone()]);
        let out = f(&mut value);
        view[range].copy_from_slice(bytemuck::bytes_of(&value));
        Ok(out)
    }

    /// Copy every whole element out of the block.
    pub fn to_vec(&self) -> Result<Vec<T>, ArenaError> {
        let view = self.allocator.resolve(self.handle)?;
        let element = element_size::<T>(view.len())?;
        Ok(view
            .chunks_exact(element)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }
}

impl<T: Pod> Clone for Accessor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            allocator: self.allocator,
            handle: self.handle,
            _marker: PhantomData,
        }
    }
}

fn element_size<T>(block_size: usize) -> Result<usize, ArenaError> {
    match size_of::<T>() {
        0 => Err(ArenaError::TypeMismatch {
            element: 0,
            size: block_size,
        }),
        n => Ok(n),
    }
}

fn element_range<T>(index: usize, block_size: usize) -> Result<Range<usize>, ArenaError> {
    let element = element_size::<T>(block_size)?;
    let out_of_range = ArenaError::OutOfRange {
        offset: index.saturating_mul(element),
        len: element,
        size: block_size,
    };
    let start = index.checked_mul(element).ok_or_else(|| out_of_range.clone())?;
    let end = start.checked_add(element).ok_or_else(|| out_of_range.clone())?;
    if end > block_size {
        return Err(out_of_range);
    }
    Ok(start..end)
}

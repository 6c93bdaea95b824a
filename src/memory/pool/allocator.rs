/*!
 * Buddy Allocation
 * Allocation, deallocation, block splitting and buddy coalescing
 */

use super::{AllocatedBlock, MemoryPool, PoolState};
use crate::core::types::{Address, Size, SizeClass, SlotIndex, NULL_ADDRESS};
use super::BlockDescriptor;
use crate::memory::types::{PoolError, PoolResult};
use crate::monitoring::PoolSpan;
use std::mem::{align_of, size_of};
use tracing::{debug, trace, warn};

impl MemoryPool {
    /// Allocate at least `size` bytes at the default alignment
    ///
    /// `Ok(None)` means a zero-byte request, or a failure that the error
    /// strategy chose to suppress.
    pub fn allocate(&self, size: Size) -> PoolResult<Option<Address>> {
        self.allocate_aligned(size, 0)
    }

    /// Allocate at least `size` bytes whose address is a multiple of `alignment`
    pub fn allocate_aligned(&self, size: Size, alignment: Size) -> PoolResult<Option<Address>> {
        if size == 0 {
            return Ok(None);
        }
        match self.try_allocate(size, alignment) {
            Ok(address) => Ok(Some(address)),
            Err(error) => {
                self.policy.handle(error)?;
                Ok(None)
            }
        }
    }

    /// Allocate room for `count` values of `T`
    pub fn allocate_array<T>(&self, count: usize) -> PoolResult<Option<Address>> {
        match size_of::<T>().checked_mul(count) {
            Some(bytes) => self.allocate_aligned(bytes, align_of::<T>()),
            None => {
                self.stats.record_allocation_failure();
                self.policy
                    .handle(PoolError::out_of_memory(Size::MAX, "array size overflows"))?;
                Ok(None)
            }
        }
    }

    /// Allocate without ever returning an error
    pub fn safe_allocate(&self, size: Size) -> Option<Address> {
        self.safe_allocate_aligned(size, 0)
    }

    pub fn safe_allocate_aligned(&self, size: Size, alignment: Size) -> Option<Address> {
        if size == 0 {
            return None;
        }
        match self.try_allocate(size, alignment) {
            Ok(address) => Some(address),
            Err(error) => {
                // Propagate collapses to null here; Abort still aborts
                let _ = self.policy.handle(error);
                None
            }
        }
    }

    /// Return a block to the pool
    ///
    /// Releasing [`NULL_ADDRESS`] is a no-op.
    pub fn deallocate(&self, address: Address) -> PoolResult<()> {
        if address == NULL_ADDRESS {
            return Ok(());
        }
        match self.try_deallocate(address) {
            Ok(()) => Ok(()),
            Err(error) => self.policy.handle(error),
        }
    }

    /// Deallocate without ever returning an error
    pub fn safe_deallocate(&self, address: Address) -> bool {
        if address == NULL_ADDRESS {
            return true;
        }
        match self.try_deallocate(address) {
            Ok(()) => true,
            Err(error) => {
                let _ = self.policy.handle(error);
                false
            }
        }
    }

    // =========================================================================
    // Core paths. Failures are counted here; the caller applies the policy
    // once the pool lock has been released.
    // =========================================================================

    fn try_allocate(&self, size: Size, alignment: Size) -> PoolResult<Address> {
        let span = PoolSpan::new("allocate", size);
        let result = self.allocate_block(size, alignment, &span);

        if let Err(error) = &result {
            self.stats.record_allocation_failure();
            span.record_error(error);
            warn!(size, alignment, error = %error, "allocation failed");
        }
        result
    }

    fn allocate_block(&self, size: Size, alignment: Size, span: &PoolSpan) -> PoolResult<Address> {
        let block_size = self.block_size_for(size, alignment)?;
        let class = self.class_of(block_size);

        let mut guard = self.state.acquire();
        let state = &mut *guard;

        let slot = match self.take_block(state, class) {
            Some(slot) => slot,
            None => {
                self.grow_locked(state, block_size)?;
                self.take_block(state, class).ok_or_else(|| {
                    PoolError::out_of_memory(size, "no block available after pool expansion")
                })?
            }
        };

        let descriptor = state
            .arena
            .get_mut(slot)
            .ok_or_else(|| PoolError::out_of_memory(size, "free list referenced a vacant slot"))?;
        descriptor.allocated = true;
        let address = descriptor.address;

        self.allocated.insert(
            address,
            AllocatedBlock {
                size: block_size,
                requested: size,
                slot,
            },
        );
        self.stats.record_allocation(block_size, size, span.elapsed());

        debug!(address, size, block_size, "block allocated");
        Ok(address)
    }

    fn try_deallocate(&self, address: Address) -> PoolResult<()> {
        let span = PoolSpan::new("deallocate", 0);
        let result = self.release_block(address, &span);

        if let Err(error) = &result {
            self.stats.record_deallocation_failure();
            if matches!(error, PoolError::InvalidPointer(_)) {
                self.stats.record_invalid_pointer();
            }
            span.record_error(error);
            warn!(address, error = %error, "deallocation failed");
        }
        result
    }

    fn release_block(&self, address: Address, span: &PoolSpan) -> PoolResult<()> {
        let mut guard = self.state.acquire();
        let state = &mut *guard;

        if !self.is_valid_pointer(address) {
            return Err(PoolError::InvalidPointer(address));
        }

        // Unknown or already released
        let (_, block) = self
            .allocated
            .remove(&address)
            .ok_or(PoolError::InvalidPointer(address))?;

        let class = self.class_of(block.size);
        if !self.free_lists[class].push(&mut state.arena, block.slot) {
            return Err(PoolError::InvalidPointer(address));
        }
        self.merge(state, block.slot);

        self.stats
            .record_deallocation(block.size, block.requested, span.elapsed());

        debug!(address, block_size = block.size, "block released");
        Ok(())
    }

    // =========================================================================
    // Split and merge
    // =========================================================================

    /// Pop a free block of `class`, splitting a larger one if needed
    pub(super) fn take_block(&self, state: &mut PoolState, class: SizeClass) -> Option<SlotIndex> {
        if let Some(slot) = self.free_lists[class].pop(&mut state.arena) {
            return Some(slot);
        }

        let (larger, slot) = (class + 1..=self.max_class())
            .find_map(|c| self.free_lists[c].pop(&mut state.arena).map(|slot| (c, slot)))?;

        debug!(
            from = self.free_lists[larger].block_size(),
            to = self.free_lists[class].block_size(),
            "splitting block"
        );
        Some(self.split(state, slot, class))
    }

    /// Halve the block in `slot` until it reaches `target`
    ///
    /// Each upper half goes to the free list one class down; the final lower
    /// half is returned unlisted.
    fn split(&self, state: &mut PoolState, mut slot: SlotIndex, target: SizeClass) -> SlotIndex {
        while let Some(block) = state.arena.get(slot).copied() {
            if self.class_of(block.size) <= target {
                break;
            }
            let half = block.size / 2;
            state.arena.remove(slot);

            let lower = state.arena.insert(BlockDescriptor::free(block.address, half));
            let upper = state
                .arena
                .insert(BlockDescriptor::free(block.address + half, half));

            self.free_lists[self.class_of(half)].push(&mut state.arena, upper);
            self.stats.record_split();
            slot = lower;
        }
        slot
    }

    /// Coalesce the free block in `slot` with its buddy, repeatedly
    fn merge(&self, state: &mut PoolState, mut slot: SlotIndex) {
        loop {
            let Some(block) = state.arena.get(slot).copied() else {
                return;
            };
            let class = self.class_of(block.size);
            if block.allocated || class >= self.max_class() {
                return;
            }

            let list = &self.free_lists[class];
            let Some(buddy_slot) = list.find(&state.arena, block.buddy_address()) else {
                return;
            };

            list.remove(&mut state.arena, buddy_slot);
            list.remove(&mut state.arena, slot);
            state.arena.remove(buddy_slot);
            state.arena.remove(slot);

            let merged = state.arena.insert(BlockDescriptor::free(
                block.parent_address(),
                block.size * 2,
            ));
            self.free_lists[class + 1].push(&mut state.arena, merged);
            self.stats.record_merge();

            trace!(address = block.parent_address(), size = block.size * 2, "buddies merged");
            slot = merged;
        }
    }
}

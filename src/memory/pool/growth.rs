/*!
 * Pool Growth
 * Segment acquisition, carving and pool reset
 */

use super::{BlockDescriptor, MemoryPool, MemorySegment, PoolState};
use crate::core::alignment::{align_up, prev_power_of_two};
use crate::core::types::{Address, Size};
use crate::memory::types::{PoolError, PoolResult};
use tracing::{error, info, warn};

impl MemoryPool {
    /// Add a segment able to hold at least `required` bytes
    ///
    /// Returns the size of the acquired segment. Growth normally follows the
    /// configured factor; under a memory limit it falls back to the smallest
    /// segment that satisfies the request.
    pub fn grow(&self, required: Size) -> PoolResult<Size> {
        let mut guard = self.state.acquire();
        self.grow_locked(&mut guard, required)
    }

    pub(super) fn grow_locked(&self, state: &mut PoolState, required: Size) -> PoolResult<Size> {
        let max_block = self.config.max_block_size;
        let current: Size = self.segments.read().iter().map(|s| s.size()).sum();

        let minimal = required
            .max(1)
            .checked_next_multiple_of(max_block)
            .ok_or_else(|| PoolError::out_of_memory(required, "growth size overflows"))?;

        // Float cast saturates; a size that cannot be rounded up falls back to `minimal`
        let by_factor = (current as f64 * (self.config.growth_factor - 1.0)) as Size;
        let mut size = by_factor
            .checked_next_multiple_of(max_block)
            .unwrap_or(minimal)
            .max(minimal);

        if let Some(limit) = self.config.max_memory_limit {
            if current.saturating_add(size) > limit {
                if current.saturating_add(minimal) > limit {
                    warn!(required, limit, current, "memory limit reached");
                    return Err(PoolError::PoolFull {
                        requested: minimal,
                        limit,
                        current,
                    });
                }
                size = minimal;
            }
        }

        let Some(memory) = self.source.acquire(size) else {
            error!(segment_size = size, current, "segment source exhausted");
            return Err(PoolError::out_of_memory(size, "segment source exhausted"));
        };

        let usable = self.install_segment(state, memory, true);
        self.stats.record_growth();

        info!(
            segment_size = size,
            usable,
            total = current + size,
            "memory pool expanded"
        );
        Ok(size)
    }

    /// Register a segment and carve it into free blocks
    pub(super) fn install_segment(
        &self,
        state: &mut PoolState,
        memory: Box<[u8]>,
        owned: bool,
    ) -> Size {
        let size = memory.len();
        let base = self.assign_base(state, size);
        let usable = self.carve(state, base, size);
        self.segments
            .write()
            .push(MemorySegment::new(base, memory, usable, owned));
        self.stats.record_segment(usable);
        usable
    }

    /// Reserve a fresh base for a segment of `size` bytes
    ///
    /// Bases stay multiples of the largest block so buddy math holds, and are
    /// never handed out twice.
    fn assign_base(&self, state: &mut PoolState, size: Size) -> Address {
        let max_block = self.config.max_block_size;
        let base = state.next_base;
        state.next_base = base + align_up(size, max_block).max(max_block);
        base
    }

    /// Cut `[base, base + size)` into maximal blocks plus one power-of-two remainder
    pub(super) fn carve(&self, state: &mut PoolState, base: Address, size: Size) -> Size {
        let max_block = self.config.max_block_size;
        let top = self.max_class();
        let mut offset = 0;

        while size - offset >= max_block {
            let slot = state
                .arena
                .insert(BlockDescriptor::free(base + offset, max_block));
            self.free_lists[top].push(&mut state.arena, slot);
            offset += max_block;
        }

        let remaining = size - offset;
        if remaining >= self.config.min_block_size {
            let block = prev_power_of_two(remaining);
            let slot = state.arena.insert(BlockDescriptor::free(base + offset, block));
            self.free_lists[self.class_of(block)].push(&mut state.arena, slot);
            offset += block;
        }
        offset
    }

    /// Return every block to the free lists
    ///
    /// Segments are kept and zeroed, so capacity is unchanged; statistics
    /// restart from zero. Each segment moves to a fresh base, so no address
    /// from before the reset is ever handed out again and releasing one fails
    /// with `InvalidPointer`.
    pub fn reset(&self) {
        let mut guard = self.state.acquire();
        let state = &mut *guard;

        for list in &self.free_lists {
            list.clear(&mut state.arena);
        }
        // Slots of live allocations are not on any list
        state.arena.clear();
        self.allocated.clear();

        let mut segments = self.segments.write();
        let mut total = 0;
        for segment in segments.iter_mut() {
            let base = self.assign_base(state, segment.size());
            segment.rebase(base);
            segment.zero();
            total += self.carve(state, base, segment.size());
        }
        self.stats.reset(total, segments.len());

        info!(total_memory = total, segments = segments.len(), "memory pool reset");
    }
}

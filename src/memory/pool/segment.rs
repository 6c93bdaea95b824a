/*!
 * Backing Segments
 *
 * Coarse regions acquired from a `SegmentSource` and carved into blocks.
 * Each segment is assigned a base in the pool's address space that is a
 * non-zero multiple of `max_block_size`, so every block is aligned to its
 * own size and `address XOR size` always lands on the true buddy.
 */

use crate::core::types::{Address, Size};
use tracing::warn;

/// Provider of raw zeroed memory
#[cfg_attr(test, mockall::automock)]
pub trait SegmentSource: Send + Sync {
    /// Acquire `size` zeroed bytes, or `None` if the environment is exhausted
    fn acquire(&self, size: Size) -> Option<Box<[u8]>>;

    /// Return a buffer obtained from `acquire`
    fn release(&self, memory: Box<[u8]>);
}

/// Heap-backed source using fallible reservation
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapSource;

impl SegmentSource for HeapSource {
    fn acquire(&self, size: Size) -> Option<Box<[u8]>> {
        let mut buffer: Vec<u8> = Vec::new();
        if let Err(e) = buffer.try_reserve_exact(size) {
            warn!(size, error = %e, "heap refused segment reservation");
            return None;
        }
        buffer.resize(size, 0);
        Some(buffer.into_boxed_slice())
    }

    fn release(&self, memory: Box<[u8]>) {
        drop(memory);
    }
}

/// One region acquired from the segment source
#[derive(Debug)]
pub struct MemorySegment {
    base: Address,
    size: Size,
    usable: Size,
    owned: bool,
    memory: Option<Box<[u8]>>,
}

impl MemorySegment {
    pub(super) fn new(base: Address, memory: Box<[u8]>, usable: Size, owned: bool) -> Self {
        Self {
            base,
            size: memory.len(),
            usable,
            owned,
            memory: Some(memory),
        }
    }

    #[inline]
    pub fn base(&self) -> Address {
        self.base
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Bytes carved into blocks (the rest is an unusable tail)
    #[inline]
    pub fn usable(&self) -> Size {
        self.usable
    }

    #[inline]
    pub fn owned(&self) -> bool {
        self.owned
    }

    #[inline]
    pub fn end(&self) -> Address {
        self.base + self.size
    }

    #[inline]
    pub fn contains(&self, address: Address) -> bool {
        address >= self.base && address < self.end()
    }

    /// Backing bytes for `[address, address + len)`, if inside this segment
    pub(super) fn bytes(&self, address: Address, len: Size) -> Option<&[u8]> {
        let offset = address.checked_sub(self.base)?;
        self.memory.as_deref()?.get(offset..offset.checked_add(len)?)
    }

    pub(super) fn bytes_mut(&mut self, address: Address, len: Size) -> Option<&mut [u8]> {
        let offset = address.checked_sub(self.base)?;
        self.memory
            .as_deref_mut()?
            .get_mut(offset..offset.checked_add(len)?)
    }

    /// Move the segment to a new place in the address space
    pub(super) fn rebase(&mut self, base: Address) {
        self.base = base;
    }

    pub(super) fn zero(&mut self) {
        if let Some(memory) = self.memory.as_deref_mut() {
            memory.fill(0);
        }
    }

    /// Hand the buffer back to `source` if the pool owns it
    pub(super) fn release_to(&mut self, source: &dyn SegmentSource) {
        if let Some(memory) = self.memory.take() {
            if self.owned {
                source.release(memory);
            }
        }
    }
}

/*!
 * Block Descriptors
 *
 * Metadata for one power-of-two block, stored in an arena of slots that
 * free lists link by index. Released slots are recycled, so splitting and
 * merging do not churn the heap.
 */

use crate::core::types::{Address, Size, SlotIndex};

/// One contiguous block, allocated or free
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub address: Address,
    pub size: Size,
    pub allocated: bool,
    /// Next slot on the owning free list; ignored while allocated
    pub next: Option<SlotIndex>,
}

impl BlockDescriptor {
    pub const fn free(address: Address, size: Size) -> Self {
        Self {
            address,
            size,
            allocated: false,
            next: None,
        }
    }

    /// The sibling produced by the same split: `address XOR size`
    #[inline]
    pub const fn buddy_address(&self) -> Address {
        self.address ^ self.size
    }

    /// Start of the parent block this block was split from
    #[inline]
    pub const fn parent_address(&self) -> Address {
        self.address & !self.size
    }

    #[inline]
    pub const fn end(&self) -> Address {
        self.address + self.size
    }

    #[inline]
    pub const fn contains(&self, address: Address) -> bool {
        address >= self.address && address < self.end()
    }
}

/// Arena of descriptor slots addressed by index
#[derive(Debug, Default)]
pub struct DescriptorArena {
    slots: Vec<Option<BlockDescriptor>>,
    vacant: Vec<SlotIndex>,
}

impl DescriptorArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a descriptor, reusing a vacant slot when one exists
    pub fn insert(&mut self, descriptor: BlockDescriptor) -> SlotIndex {
        match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot] = Some(descriptor);
                slot
            }
            None => {
                self.slots.push(Some(descriptor));
                self.slots.len() - 1
            }
        }
    }

    /// Vacate a slot, returning the descriptor it held
    pub fn remove(&mut self, slot: SlotIndex) -> Option<BlockDescriptor> {
        let descriptor = self.slots.get_mut(slot)?.take()?;
        self.vacant.push(slot);
        Some(descriptor)
    }

    #[inline]
    pub fn get(&self, slot: SlotIndex) -> Option<&BlockDescriptor> {
        self.slots.get(slot)?.as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, slot: SlotIndex) -> Option<&mut BlockDescriptor> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Number of live descriptors
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.vacant.clear();
    }
}

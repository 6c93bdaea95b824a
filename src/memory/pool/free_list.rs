/*!
 * Free List
 * Singly linked list of free descriptors of one size class
 */

use super::block::DescriptorArena;
use crate::core::types::{Address, Size, SlotIndex};
use parking_lot::Mutex;
use tracing::error;

#[derive(Debug, Default)]
struct ListHead {
    head: Option<SlotIndex>,
    len: usize,
}

/// Free list for one size class
///
/// The list owns slot indices; descriptors live in the pool's arena. Each
/// list carries its own lock so push/pop/remove are linearizable per list.
#[derive(Debug)]
pub struct FreeList {
    block_size: Size,
    list: Mutex<ListHead>,
}

impl FreeList {
    pub fn new(block_size: Size) -> Self {
        Self {
            block_size,
            list: Mutex::new(ListHead::default()),
        }
    }

    #[inline]
    pub fn block_size(&self) -> Size {
        self.block_size
    }

    /// Push a free descriptor onto the head of the list
    ///
    /// Returns false if the slot is vacant or the descriptor is the wrong size.
    pub fn push(&self, arena: &mut DescriptorArena, slot: SlotIndex) -> bool {
        let mut list = self.list.lock();

        let Some(descriptor) = arena.get_mut(slot) else {
            error!(slot, "push of vacant descriptor slot");
            return false;
        };
        if descriptor.size != self.block_size {
            error!(
                slot,
                size = descriptor.size,
                expected = self.block_size,
                "descriptor pushed to the wrong free list"
            );
            return false;
        }

        descriptor.allocated = false;
        descriptor.next = list.head;
        list.head = Some(slot);
        list.len += 1;
        true
    }

    /// Pop the head descriptor
    pub fn pop(&self, arena: &mut DescriptorArena) -> Option<SlotIndex> {
        let mut list = self.list.lock();
        let slot = list.head?;

        let descriptor = arena.get_mut(slot)?;
        list.head = descriptor.next.take();
        list.len -= 1;
        Some(slot)
    }

    /// Unlink a specific slot
    pub fn remove(&self, arena: &mut DescriptorArena, slot: SlotIndex) -> bool {
        let mut list = self.list.lock();

        if list.head == Some(slot) {
            list.head = arena.get_mut(slot).and_then(|d| d.next.take());
            list.len -= 1;
            return true;
        }

        let mut current = list.head;
        let mut visited = 0;
        while let Some(idx) = current {
            if visited > list.len {
                error!(block_size = self.block_size, "cycle detected in free list");
                return false;
            }

            let next = arena.get(idx).and_then(|d| d.next);
            if next == Some(slot) {
                let after = arena.get_mut(slot).and_then(|d| d.next.take());
                if let Some(prev) = arena.get_mut(idx) {
                    prev.next = after;
                }
                list.len -= 1;
                return true;
            }

            current = next;
            visited += 1;
        }

        false
    }

    /// Slot of the free descriptor starting at `address`, if listed
    pub fn find(&self, arena: &DescriptorArena, address: Address) -> Option<SlotIndex> {
        let list = self.list.lock();

        let mut current = list.head;
        let mut visited = 0;
        while let Some(idx) = current {
            if visited > list.len {
                error!(block_size = self.block_size, "cycle detected in free list");
                return None;
            }

            let descriptor = arena.get(idx)?;
            if descriptor.address == address {
                return Some(idx);
            }

            current = descriptor.next;
            visited += 1;
        }

        None
    }

    /// Unlink every descriptor and vacate its arena slot
    pub(super) fn clear(&self, arena: &mut DescriptorArena) {
        let mut list = self.list.lock();

        let mut current = list.head.take();
        while let Some(idx) = current {
            current = arena.remove(idx).and_then(|d| d.next);
        }
        list.len = 0;
    }

    pub fn len(&self) -> usize {
        self.list.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.list.lock().head.is_none()
    }

    /// Addresses on the list, head first
    pub fn addresses(&self, arena: &DescriptorArena) -> Vec<Address> {
        let list = self.list.lock();

        let mut out = Vec::with_capacity(list.len);
        let mut current = list.head;
        while let Some(idx) = current {
            if out.len() > list.len {
                break;
            }
            let Some(descriptor) = arena.get(idx) else {
                break;
            };
            out.push(descriptor.address);
            current = descriptor.next;
        }
        out
    }
}

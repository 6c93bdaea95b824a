/*!
 * Block Storage
 * Byte-level access to allocated blocks
 */

use super::MemoryPool;
use crate::core::types::{Address, Size};
use crate::memory::types::{PoolError, PoolResult};
use tracing::trace;

impl MemoryPool {
    /// Locate the live block containing `[address, address + len)`
    fn block_range(&self, address: Address, len: Size) -> PoolResult<(Address, Size)> {
        let end = address
            .checked_add(len)
            .ok_or(PoolError::InvalidPointer(address))?;

        // Blocks are aligned to their own size, so the only candidate start in
        // each class is the address rounded down to that class size
        let found = self.free_lists.iter().find_map(|list| {
            let block_size = list.block_size();
            let start = address & !(block_size - 1);
            self.allocated
                .get(&start)
                .filter(|entry| entry.size == block_size)
                .map(|_| (start, block_size))
        });

        match found {
            Some((base, size)) if end <= base + size => Ok((base, size)),
            _ => Err(PoolError::InvalidPointer(address)),
        }
    }

    /// Copy `data` into an allocated block
    ///
    /// The write must fall entirely inside one live allocation.
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> PoolResult<()> {
        let (base, _) = self.block_range(address, data.len())?;

        let mut segments = self.segments.write();
        let target = segments
            .iter_mut()
            .find(|segment| segment.contains(address))
            .and_then(|segment| segment.bytes_mut(address, data.len()))
            .ok_or(PoolError::InvalidPointer(address))?;
        target.copy_from_slice(data);

        trace!(address, len = data.len(), offset = address - base, "wrote bytes");
        Ok(())
    }

    /// Copy `len` bytes out of an allocated block
    pub fn read_bytes(&self, address: Address, len: Size) -> PoolResult<Vec<u8>> {
        let (base, _) = self.block_range(address, len)?;

        let segments = self.segments.read();
        let data = segments
            .iter()
            .find(|segment| segment.contains(address))
            .and_then(|segment| segment.bytes(address, len))
            .ok_or(PoolError::InvalidPointer(address))?
            .to_vec();

        trace!(address, len, offset = address - base, "read bytes");
        Ok(data)
    }
}

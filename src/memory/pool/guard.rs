/*!
 * Block Guard
 *
 * RAII ownership of a pool allocation
 */

use super::MemoryPool;
use crate::core::types::{Address, Size};
use crate::memory::types::PoolResult;
use std::mem::ManuallyDrop;
use tracing::warn;

/// Allocated block returned to its pool on drop
///
/// # Example
///
/// ```
/// use buddy_pool::memory::{MemoryPool, PoolConfig};
///
/// let pool = MemoryPool::new(PoolConfig::default())?;
/// {
///     let block = pool.allocate_guard(256)?.expect("non-zero request");
///     block.write(b"scratch")?;
/// } // released here
/// assert_eq!(pool.get_stats().live_blocks, 0);
/// # Ok::<(), buddy_pool::memory::PoolError>(())
/// ```
#[must_use = "dropping the guard releases the block immediately"]
pub struct PoolBlock<'a> {
    pool: &'a MemoryPool,
    address: Address,
    size: Size,
}

impl<'a> PoolBlock<'a> {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Size class of the block, not the requested size
    pub fn size(&self) -> Size {
        self.size
    }

    pub fn write(&self, data: &[u8]) -> PoolResult<()> {
        self.pool.write_bytes(self.address, data)
    }

    pub fn read(&self, len: Size) -> PoolResult<Vec<u8>> {
        self.pool.read_bytes(self.address, len)
    }

    /// Release now and observe the outcome
    pub fn release(self) -> PoolResult<()> {
        let this = ManuallyDrop::new(self);
        this.pool.deallocate(this.address)
    }

    /// Give up ownership without releasing
    pub fn into_address(self) -> Address {
        ManuallyDrop::new(self).address
    }
}

impl Drop for PoolBlock<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.pool.deallocate(self.address) {
            warn!(address = self.address, error = %e, "failed to release guarded block");
        }
    }
}

impl std::fmt::Debug for PoolBlock<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolBlock")
            .field("address", &format_args!("{:#x}", self.address))
            .field("size", &self.size)
            .finish()
    }
}

impl MemoryPool {
    /// Allocate a block that is released when the guard drops
    pub fn allocate_guard(&self, size: Size) -> PoolResult<Option<PoolBlock<'_>>> {
        let Some(address) = self.allocate(size)? else {
            return Ok(None);
        };
        let size = self.get_block_size(address).unwrap_or(size);
        Ok(Some(PoolBlock {
            pool: self,
            address,
            size,
        }))
    }
}

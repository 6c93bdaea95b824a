/*!
 * Memory Traits
 * Allocation and reporting abstractions
 */

use super::types::*;
use crate::core::types::{Address, Size};

/// Allocator interface
pub trait Allocator: Send + Sync {
    /// Allocate at least `size` bytes; `Ok(None)` is a null handle
    fn allocate(&self, size: Size) -> PoolResult<Option<Address>>;

    /// Release a block obtained from `allocate`
    fn deallocate(&self, address: Address) -> PoolResult<()>;

    /// Check if an address lies inside memory managed by the allocator
    fn is_valid(&self, address: Address) -> bool;

    /// Get the size of an allocated block
    fn block_size(&self, address: Address) -> Option<Size>;
}

/// Pool statistics provider
pub trait PoolReporting: Send + Sync {
    fn usage(&self) -> MemoryUsage;

    fn metrics(&self) -> PerformanceMetrics;

    fn errors(&self) -> ErrorStats;

    fn health(&self) -> HealthReport;

    /// Get memory info as (total, used, free)
    fn info(&self) -> (Size, Size, Size) {
        let usage = self.usage();
        (usage.total, usage.used, usage.free)
    }

    fn is_healthy(&self) -> bool {
        self.health().status == HealthStatus::Healthy
    }
}

/*!
 * Buddy Memory Pool
 *
 * Thread-safe dynamic memory pool built on binary buddy allocation.
 *
 * ## Layout
 *
 * - **Size classes**: one free list per power of two between `min_block_size`
 *   and `max_block_size`; class index = log2(size) - log2(min_block_size)
 * - **Segments**: coarse regions from a `SegmentSource`, carved into
 *   `max_block_size` blocks (plus one power-of-two remainder)
 * - **Descriptors**: arena slots linked by index from the free lists
 * - **Registry**: address -> (size, slot) for every live allocation
 *
 * ## Algorithm
 *
 * - **Allocate**: pop the target class, else split the first larger free
 *   block down to it, else grow by a new segment and retry once
 * - **Deallocate**: push the block to its class, then merge with its buddy
 *   (`address XOR size`) repeatedly up the hierarchy
 *
 * ## Locking
 *
 * One pool-wide lock serializes structural changes. Statistics, the registry,
 * segments and each free list have their own locks, so reporting and size
 * queries never wait for a whole allocation. Lock order: pool -> segments.
 */

mod allocator;
mod block;
mod free_list;
mod growth;
mod guard;
mod locking;
mod segment;
mod storage;

pub use block::{BlockDescriptor, DescriptorArena};
pub use free_list::FreeList;
pub use guard::PoolBlock;
pub use locking::PoolLock;
pub use segment::{HeapSource, MemorySegment, SegmentSource};

use super::config::PoolConfig;
use super::policy::{ErrorPolicy, ErrorStrategy};
use super::stats::PoolStats;
use super::traits::{Allocator, PoolReporting};
use super::types::{
    ErrorStats, HealthReport, MemoryUsage, PerformanceMetrics, PoolError, PoolResult,
    StatsSnapshot,
};
use crate::core::alignment::system_alignment;
use crate::core::shards::{shard_count, Contention};
use crate::core::types::{Address, Size, SizeClass, SlotIndex, NULL_ADDRESS};
use ahash::RandomState;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

/// Registry entry for a live allocation
#[derive(Debug, Clone, Copy)]
pub(super) struct AllocatedBlock {
    pub size: Size,
    pub requested: Size,
    pub slot: SlotIndex,
}

/// State serialized by the pool-wide lock
#[derive(Debug)]
pub(super) struct PoolState {
    pub arena: DescriptorArena,
    /// Base assigned to the next segment
    pub next_base: Address,
}

/// Buddy memory pool
///
/// # Example
///
/// ```
/// use buddy_pool::memory::{MemoryPool, PoolConfig};
///
/// let pool = MemoryPool::new(PoolConfig::default().with_initial_size(64 * 1024))?;
/// let addr = pool.allocate(100)?.expect("non-zero request");
/// assert_eq!(pool.get_block_size(addr), Some(128));
/// pool.deallocate(addr)?;
/// # Ok::<(), buddy_pool::memory::PoolError>(())
/// ```
///
/// # Performance
/// - Cache-line aligned to prevent false sharing between the lock and stats
#[repr(C, align(64))]
pub struct MemoryPool {
    config: PoolConfig,
    min_shift: u32,
    free_lists: Vec<FreeList>,
    state: PoolLock<PoolState>,
    segments: RwLock<Vec<MemorySegment>>,
    allocated: DashMap<Address, AllocatedBlock, RandomState>,
    stats: PoolStats,
    policy: ErrorPolicy,
    source: Arc<dyn SegmentSource>,
}

impl MemoryPool {
    /// Create a pool backed by the heap
    pub fn new(config: PoolConfig) -> PoolResult<Self> {
        Self::with_source(config, Arc::new(HeapSource))
    }

    /// Create a pool backed by a custom segment source
    ///
    /// Configuration errors and failure to acquire the initial segment always
    /// propagate, regardless of the configured error strategy.
    pub fn with_source(config: PoolConfig, source: Arc<dyn SegmentSource>) -> PoolResult<Self> {
        config.validate()?;

        let free_lists = (0..config.size_class_count())
            .map(|class| FreeList::new(config.min_block_size << class))
            .collect();

        let pool = Self {
            min_shift: config.min_block_size.trailing_zeros(),
            free_lists,
            state: PoolLock::new(
                PoolState {
                    arena: DescriptorArena::new(),
                    next_base: config.max_block_size,
                },
                config.thread_safe,
            ),
            segments: RwLock::new(Vec::new()),
            allocated: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                shard_count(Contention::High),
            ),
            stats: PoolStats::new(config.min_block_size),
            policy: ErrorPolicy::new(config.error_strategy),
            source,
            config,
        };

        if pool.config.initial_size > 0 {
            let initial = pool.config.initial_size;
            let memory = pool.source.acquire(initial).ok_or_else(|| {
                PoolError::out_of_memory(initial, "failed to acquire initial segment")
            })?;
            let mut state = pool.state.acquire();
            pool.install_segment(&mut state, memory, true);
        }

        info!(
            initial_size = pool.config.initial_size,
            min_block_size = pool.config.min_block_size,
            max_block_size = pool.config.max_block_size,
            size_classes = pool.free_lists.len(),
            thread_safe = pool.config.thread_safe,
            "Buddy memory pool initialized"
        );

        Ok(pool)
    }

    /// Configuration the pool was built with
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    // =========================================================================
    // Size classing
    // =========================================================================

    #[inline]
    pub(super) fn class_of(&self, block_size: Size) -> SizeClass {
        (block_size.trailing_zeros() - self.min_shift) as SizeClass
    }

    #[inline]
    pub(super) fn max_class(&self) -> SizeClass {
        self.free_lists.len() - 1
    }

    /// Block size serving `size` bytes at `alignment`
    ///
    /// Blocks are aligned to their own size, so the alignment only ever
    /// raises the class. `0` selects the platform word size; other values
    /// round up to a power of two.
    pub(super) fn block_size_for(&self, size: Size, alignment: Size) -> PoolResult<Size> {
        let exceeds = || PoolError::out_of_memory(size, "exceeds maximum block size");

        let alignment = match alignment {
            0 => system_alignment(),
            a => a.checked_next_power_of_two().ok_or_else(exceeds)?,
        };

        let block_size = size
            .max(self.config.min_block_size)
            .checked_next_power_of_two()
            .ok_or_else(exceeds)?
            .max(alignment);

        if block_size > self.config.max_block_size {
            return Err(exceeds());
        }
        Ok(block_size)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether `address` lies inside any backing segment
    pub fn is_valid_pointer(&self, address: Address) -> bool {
        address != NULL_ADDRESS && self.segments.read().iter().any(|s| s.contains(address))
    }

    /// Whether `address` is the start of a live allocation
    pub fn is_allocated(&self, address: Address) -> bool {
        self.allocated.contains_key(&address)
    }

    /// Size class of a live allocation
    pub fn get_block_size(&self, address: Address) -> Option<Size> {
        self.allocated.get(&address).map(|entry| entry.size)
    }

    pub fn set_thread_safe(&self, enabled: bool) {
        self.state.set_thread_safe(enabled);
        info!(enabled, "pool thread safety toggled");
    }

    pub fn is_thread_safe(&self) -> bool {
        self.state.thread_safe()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.read().len()
    }

    /// `(block_size, free blocks)` for every size class, smallest first
    pub fn free_block_counts(&self) -> Vec<(Size, usize)> {
        self.free_lists
            .iter()
            .map(|list| (list.block_size(), list.len()))
            .collect()
    }

    /// Free bytes sitting on the free lists
    pub fn free_capacity(&self) -> Size {
        self.free_lists
            .iter()
            .map(|list| list.block_size() * list.len())
            .sum()
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn get_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn get_memory_usage(&self) -> MemoryUsage {
        self.stats.memory_usage()
    }

    pub fn get_performance_metrics(&self) -> PerformanceMetrics {
        self.stats.performance_metrics()
    }

    pub fn get_error_stats(&self) -> ErrorStats {
        self.stats.error_stats()
    }

    pub fn get_health_report(&self) -> HealthReport {
        self.stats.health_report()
    }

    /// Statistics summary followed by the free blocks per size class
    pub fn get_detailed_report(&self) -> String {
        let mut report = self.stats.summary();

        report.push_str("\n  Free Blocks by Size Class:");
        for (block_size, count) in self.free_block_counts().into_iter().rev() {
            if count > 0 {
                let _ = write!(
                    report,
                    "\n    {:>8} bytes: {} blocks ({} bytes)",
                    block_size,
                    count,
                    block_size * count
                );
            }
        }
        report
    }

    /// Zero the counters; capacity and live usage are kept
    pub fn reset_stats(&self) {
        self.stats.reset_counters();
    }

    // =========================================================================
    // Error policy
    // =========================================================================

    pub fn set_error_handling_strategy(&self, strategy: ErrorStrategy) {
        self.policy.set_strategy(strategy);
    }

    pub fn error_handling_strategy(&self) -> ErrorStrategy {
        self.policy.strategy()
    }

    /// Logger invoked by `ErrorStrategy::LogAndContinue`
    pub fn set_error_logger<F>(&self, logger: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.policy.set_logger(Arc::new(logger));
    }

    pub fn clear_error_logger(&self) {
        self.policy.clear_logger();
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        let source = Arc::clone(&self.source);
        for segment in self.segments.get_mut().iter_mut() {
            segment.release_to(source.as_ref());
        }
    }
}

impl std::fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryPool")
            .field("config", &self.config)
            .field("segments", &self.segment_count())
            .field("live_blocks", &self.allocated.len())
            .field("policy", &self.policy)
            .finish()
    }
}

// Implement trait interfaces
impl Allocator for MemoryPool {
    fn allocate(&self, size: Size) -> PoolResult<Option<Address>> {
        MemoryPool::allocate(self, size)
    }

    fn deallocate(&self, address: Address) -> PoolResult<()> {
        MemoryPool::deallocate(self, address)
    }

    fn is_valid(&self, address: Address) -> bool {
        MemoryPool::is_valid_pointer(self, address)
    }

    fn block_size(&self, address: Address) -> Option<Size> {
        MemoryPool::get_block_size(self, address)
    }
}

impl PoolReporting for MemoryPool {
    fn usage(&self) -> MemoryUsage {
        self.get_memory_usage()
    }

    fn metrics(&self) -> PerformanceMetrics {
        self.get_performance_metrics()
    }

    fn errors(&self) -> ErrorStats {
        self.get_error_stats()
    }

    fn health(&self) -> HealthReport {
        self.get_health_report()
    }
}

/*!
 * Buddy Pool Library
 * Thread-safe binary buddy memory pool exposed as a library
 */

pub mod core;
pub mod memory;
pub mod monitoring;

// Re-exports
pub use crate::core::types::{Address, Size, NULL_ADDRESS};
pub use memory::{
    ErrorStrategy, HealthStatus, MemoryPool, PoolBlock, PoolConfig, PoolError, PoolResult,
    StatsSnapshot,
};
pub use monitoring::init_tracing;

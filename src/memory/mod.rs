/*!
 * Memory Module
 * Buddy memory pool and its configuration, policy and statistics
 */

pub mod config;
pub mod policy;
pub mod pool;
pub mod stats;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use config::PoolConfig;
pub use policy::{ErrorLogger, ErrorPolicy, ErrorStrategy};
pub use pool::{HeapSource, MemoryPool, PoolBlock, SegmentSource};
pub use stats::PoolStats;
pub use traits::*;
pub use types::*;

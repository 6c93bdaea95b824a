/*!
 * Core Module
 * Fundamental types, limits, and address arithmetic
 */

pub mod alignment;
pub mod limits;
pub mod shards;
pub mod types;

// Re-export for convenience
pub use alignment::*;
pub use shards::{shard_count, Contention};
pub use types::*;

/*!
 * Core Types
 * Common types used across the pool
 */

/// Opaque block handle in the pool's address space
///
/// Addresses are never dereferenced; byte access goes through the pool.
pub type Address = usize;

/// Size type for memory operations
pub type Size = usize;

/// The null handle. No segment is ever placed at address zero.
pub const NULL_ADDRESS: Address = 0;

/// Index of a power-of-two size class (0 = `min_block_size`)
pub type SizeClass = usize;

/// Slot index into the descriptor arena
pub type SlotIndex = usize;

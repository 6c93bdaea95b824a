/*!
 * Pool Limits and Defaults
 *
 * Centralized location for default sizes, thresholds, and histogram buckets.
 * Grouped by domain; performance-relevant values are marked with [PERF].
 */

use super::types::Size;

// =============================================================================
// POOL GEOMETRY
// =============================================================================

/// Initial pool capacity (1MB)
pub const DEFAULT_INITIAL_SIZE: Size = 1024 * 1024;

/// Smallest block handed out (16 bytes)
pub const DEFAULT_MIN_BLOCK_SIZE: Size = 16;

/// Largest block handed out (1MB)
/// Segments are carved into blocks of this size
pub const DEFAULT_MAX_BLOCK_SIZE: Size = 1024 * 1024;

/// Multiplier applied to total capacity when the pool grows
pub const DEFAULT_GROWTH_FACTOR: f64 = 2.0;

// =============================================================================
// HEALTH THRESHOLDS (percent)
// =============================================================================

/// Error rate above which the pool is reported as critical
pub const CRITICAL_ERROR_RATE: f64 = 10.0;

/// Fragmentation rate above which the pool is reported as critical
pub const CRITICAL_FRAGMENTATION_RATE: f64 = 50.0;

/// Error rate above which the pool is reported with warnings
pub const WARNING_ERROR_RATE: f64 = 5.0;

/// Fragmentation rate above which the pool is reported with warnings
pub const WARNING_FRAGMENTATION_RATE: f64 = 30.0;

// =============================================================================
// LATENCY TRACKING
// =============================================================================

/// Latency histogram bucket upper bounds in nanoseconds
/// [PERF] Covers the uncontended fast path up to badly contended growth
pub const LATENCY_BUCKETS_NS: [u64; 12] = [
    100, 250, 500, 1_000, 2_500, 5_000, 10_000, 25_000, 50_000, 100_000, 1_000_000, 10_000_000,
];

/// Operations slower than this are logged at warn level (1ms)
pub const SLOW_OPERATION_NS: u64 = 1_000_000;

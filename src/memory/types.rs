/*!
 * Memory Types
 * Errors and report types for the buddy pool
 */

use crate::core::types::{Address, Size};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Pool errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum PoolError {
    #[error("Out of memory: requested {requested} bytes ({reason})")]
    #[diagnostic(
        code(pool::out_of_memory),
        help("Raise max_block_size, allow growth, or free outstanding blocks.")
    )]
    OutOfMemory { requested: Size, reason: String },

    #[error("Invalid pointer: 0x{0:x}")]
    #[diagnostic(
        code(pool::invalid_pointer),
        help("The address was never returned by this pool or has already been freed.")
    )]
    InvalidPointer(Address),

    #[error("Pool full: growing by {requested} bytes would exceed the {limit} byte limit ({current} bytes in use)")]
    #[diagnostic(
        code(pool::pool_full),
        help("Raise max_memory_limit or release memory back to the pool.")
    )]
    PoolFull {
        requested: Size,
        limit: Size,
        current: Size,
    },

    #[error("Invalid alignment: {0}")]
    #[diagnostic(
        code(pool::invalid_alignment),
        help("Block sizes must be powers of two with min_block_size <= max_block_size.")
    )]
    InvalidAlignment(String),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(pool::invalid_config))]
    InvalidConfig(String),
}

impl PoolError {
    /// Discriminant of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PoolError::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            PoolError::InvalidPointer(_) => ErrorKind::InvalidPointer,
            PoolError::PoolFull { .. } => ErrorKind::PoolFull,
            PoolError::InvalidAlignment(_) => ErrorKind::InvalidAlignment,
            PoolError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    pub(crate) fn out_of_memory(requested: Size, reason: impl Into<String>) -> Self {
        PoolError::OutOfMemory {
            requested,
            reason: reason.into(),
        }
    }
}

/// Error discriminant, usable for matching and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OutOfMemory,
    InvalidPointer,
    PoolFull,
    InvalidAlignment,
    InvalidConfig,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            ErrorKind::OutOfMemory => write!(f, "OUT_OF_MEMORY"),
            ErrorKind::InvalidPointer => write!(f, "INVALID_POINTER"),
            ErrorKind::PoolFull => write!(f, "POOL_FULL"),
            ErrorKind::InvalidAlignment => write!(f, "INVALID_ALIGNMENT"),
            ErrorKind::InvalidConfig => write!(f, "INVALID_CONFIG"),
        }
    }
}

/// Memory usage snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub total: Size,
    pub used: Size,
    pub free: Size,
    pub usage_percent: f64,
}

/// Latency and throughput snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_alloc_time_ns: f64,
    pub avg_dealloc_time_ns: f64,
    pub max_alloc_time_ns: u64,
    pub max_dealloc_time_ns: u64,
    pub p50_alloc_time_ns: u64,
    pub p99_alloc_time_ns: u64,
    pub p50_dealloc_time_ns: u64,
    pub p99_dealloc_time_ns: u64,
    pub allocation_count: u64,
    pub deallocation_count: u64,
}

/// Failure counters and rates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub allocation_failures: u64,
    pub deallocation_failures: u64,
    pub invalid_pointer_errors: u64,
    pub alloc_failure_rate: f64,
    pub dealloc_failure_rate: f64,
}

/// Health classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Warning => write!(f, "WARNING"),
            HealthStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Health report derived from the statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub message: String,
    pub fragmentation_rate: f64,
    pub memory_usage: f64,
    pub error_rate: f64,
}

/// Full statistics snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_memory: Size,
    pub used_memory: Size,
    pub free_memory: Size,
    pub requested_memory: Size,
    pub allocation_count: u64,
    pub deallocation_count: u64,
    pub live_blocks: u64,
    pub peak_live_blocks: u64,
    pub peak_memory_usage: Size,
    pub fragment_count: u64,
    pub allocation_failures: u64,
    pub deallocation_failures: u64,
    pub invalid_pointer_errors: u64,
    pub growth_events: u64,
    pub segment_count: usize,
    pub total_alloc_time_ns: u64,
    pub total_dealloc_time_ns: u64,
    pub max_alloc_time_ns: u64,
    pub max_dealloc_time_ns: u64,
    pub block_size_distribution: BTreeMap<Size, u64>,
    pub uptime_secs: f64,
}

impl StatsSnapshot {
    pub fn memory_usage_percent(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        self.used_memory as f64 / self.total_memory as f64 * 100.0
    }

    /// Bytes lost to rounding requests up to their size class
    pub fn internal_waste(&self) -> Size {
        self.used_memory.saturating_sub(self.requested_memory)
    }
}

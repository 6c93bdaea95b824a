/*!
 * Pool Configuration
 * Construction-time options, validated before any memory is acquired
 */

use super::policy::ErrorStrategy;
use super::types::{PoolError, PoolResult};
use crate::core::limits::{
    DEFAULT_GROWTH_FACTOR, DEFAULT_INITIAL_SIZE, DEFAULT_MAX_BLOCK_SIZE, DEFAULT_MIN_BLOCK_SIZE,
};
use crate::core::types::Size;
use serde::{Deserialize, Serialize};

/// Memory pool configuration
///
/// # Example
///
/// ```
/// use buddy_pool::memory::PoolConfig;
///
/// let config = PoolConfig::default()
///     .with_initial_size(64 * 1024)
///     .with_block_sizes(32, 16 * 1024)
///     .with_growth_factor(1.5);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Bytes acquired at construction (0 defers to the first growth)
    pub initial_size: Size,
    /// Smallest size class, a power of two
    pub min_block_size: Size,
    /// Largest size class, a power of two >= `min_block_size`
    pub max_block_size: Size,
    pub thread_safe: bool,
    /// Multiplier applied to total capacity on expansion
    pub growth_factor: f64,
    /// Ceiling on total segment bytes; `None` is unlimited
    pub max_memory_limit: Option<Size>,
    pub error_strategy: ErrorStrategy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_SIZE,
            min_block_size: DEFAULT_MIN_BLOCK_SIZE,
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            thread_safe: true,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            max_memory_limit: None,
            error_strategy: ErrorStrategy::default(),
        }
    }
}

impl PoolConfig {
    pub fn with_initial_size(mut self, initial_size: Size) -> Self {
        self.initial_size = initial_size;
        self
    }

    pub fn with_block_sizes(mut self, min_block_size: Size, max_block_size: Size) -> Self {
        self.min_block_size = min_block_size;
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_thread_safe(mut self, thread_safe: bool) -> Self {
        self.thread_safe = thread_safe;
        self
    }

    pub fn with_growth_factor(mut self, growth_factor: f64) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    pub fn with_memory_limit(mut self, limit: Size) -> Self {
        self.max_memory_limit = Some(limit);
        self
    }

    pub fn with_error_strategy(mut self, strategy: ErrorStrategy) -> Self {
        self.error_strategy = strategy;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> PoolResult<Self> {
        serde_json::from_str(json).map_err(|e| PoolError::InvalidConfig(e.to_string()))
    }

    /// Check block sizes and growth parameters
    pub fn validate(&self) -> PoolResult<()> {
        if !self.min_block_size.is_power_of_two() {
            return Err(PoolError::InvalidAlignment(format!(
                "minimum block size {} must be a power of 2",
                self.min_block_size
            )));
        }

        if !self.max_block_size.is_power_of_two() || self.max_block_size < self.min_block_size {
            return Err(PoolError::InvalidAlignment(format!(
                "maximum block size {} must be a power of 2 and >= minimum block size {}",
                self.max_block_size, self.min_block_size
            )));
        }

        if !self.growth_factor.is_finite() || self.growth_factor < 1.0 {
            return Err(PoolError::InvalidConfig(format!(
                "growth factor {} must be a finite value >= 1.0",
                self.growth_factor
            )));
        }

        Ok(())
    }

    /// Number of size classes: log2(max / min) + 1
    #[inline]
    pub fn size_class_count(&self) -> usize {
        (self.max_block_size.trailing_zeros() - self.min_block_size.trailing_zeros()) as usize + 1
    }
}

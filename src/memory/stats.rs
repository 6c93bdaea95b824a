/*!
 * Pool Statistics
 *
 * Thread-safe counters and latency histograms for the buddy pool. Guarded by
 * its own lock, independent of the pool lock, so reporting never waits on an
 * allocation for longer than a counter update. Readers may observe the state
 * just before or just after any in-flight operation.
 */

use super::types::{
    ErrorStats, HealthReport, HealthStatus, MemoryUsage, PerformanceMetrics, StatsSnapshot,
};
use crate::core::limits::{
    CRITICAL_ERROR_RATE, CRITICAL_FRAGMENTATION_RATE, LATENCY_BUCKETS_NS, WARNING_ERROR_RATE,
    WARNING_FRAGMENTATION_RATE,
};
use crate::core::types::Size;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::{Duration, Instant};

/// Latency histogram with fixed nanosecond buckets
///
/// `counts[i]` is cumulative: the number of observations `<= buckets[i]`.
#[derive(Debug, Clone)]
struct Histogram {
    buckets: &'static [u64],
    counts: Vec<u64>,
    sum: u64,
    count: u64,
    max: u64,
}

impl Histogram {
    fn new(buckets: &'static [u64]) -> Self {
        Self {
            buckets,
            counts: vec![0; buckets.len()],
            sum: 0,
            count: 0,
            max: 0,
        }
    }

    fn observe(&mut self, value: u64) {
        self.sum = self.sum.saturating_add(value);
        self.count += 1;
        self.max = self.max.max(value);

        for (i, &bucket) in self.buckets.iter().enumerate() {
            if value <= bucket {
                self.counts[i] += 1;
            }
        }
    }

    /// Upper bound of the bucket holding the `p` quantile; observations past
    /// the last bucket report the maximum seen
    fn percentile(&self, p: f64) -> u64 {
        if self.count == 0 {
            return 0;
        }

        let target = ((self.count as f64 * p).ceil() as u64).max(1);
        for (i, &count) in self.counts.iter().enumerate() {
            if count >= target {
                return self.buckets[i].min(self.max);
            }
        }
        self.max
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }
}

#[derive(Debug, Clone)]
struct StatsInner {
    total_memory: Size,
    used_memory: Size,
    requested_memory: Size,
    allocation_count: u64,
    deallocation_count: u64,
    live_blocks: u64,
    peak_live_blocks: u64,
    peak_memory_usage: Size,
    fragment_count: u64,
    allocation_failures: u64,
    deallocation_failures: u64,
    invalid_pointer_errors: u64,
    growth_events: u64,
    segment_count: usize,
    alloc_latency: Histogram,
    dealloc_latency: Histogram,
    block_size_distribution: BTreeMap<Size, u64>,
    created_at: Instant,
    last_access: Instant,
}

impl StatsInner {
    fn new(total_memory: Size, segment_count: usize) -> Self {
        let now = Instant::now();
        Self {
            total_memory,
            used_memory: 0,
            requested_memory: 0,
            allocation_count: 0,
            deallocation_count: 0,
            live_blocks: 0,
            peak_live_blocks: 0,
            peak_memory_usage: 0,
            fragment_count: 0,
            allocation_failures: 0,
            deallocation_failures: 0,
            invalid_pointer_errors: 0,
            growth_events: 0,
            segment_count,
            alloc_latency: Histogram::new(&LATENCY_BUCKETS_NS),
            dealloc_latency: Histogram::new(&LATENCY_BUCKETS_NS),
            block_size_distribution: BTreeMap::new(),
            created_at: now,
            last_access: now,
        }
    }

    fn touch(&mut self) {
        self.last_access = Instant::now();
    }

    fn free_memory(&self) -> Size {
        self.total_memory.saturating_sub(self.used_memory)
    }

    fn usage_percent(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        self.used_memory as f64 / self.total_memory as f64 * 100.0
    }

    fn fragmentation_rate(&self, min_block_size: Size) -> f64 {
        let free_units = self.free_memory() / min_block_size;
        if free_units == 0 {
            return 0.0;
        }
        self.fragment_count as f64 / free_units as f64 * 100.0
    }

    fn alloc_failure_rate(&self) -> f64 {
        let attempts = self.allocation_count + self.allocation_failures;
        if attempts == 0 {
            return 0.0;
        }
        self.allocation_failures as f64 / attempts as f64
    }

    fn dealloc_failure_rate(&self) -> f64 {
        let attempts = self.deallocation_count + self.deallocation_failures;
        if attempts == 0 {
            return 0.0;
        }
        self.deallocation_failures as f64 / attempts as f64
    }
}

/// Statistics recorder shared by every pool operation
#[derive(Debug)]
pub struct PoolStats {
    min_block_size: Size,
    inner: RwLock<StatsInner>,
}

impl PoolStats {
    pub fn new(min_block_size: Size) -> Self {
        Self {
            min_block_size,
            inner: RwLock::new(StatsInner::new(0, 0)),
        }
    }

    /// Record capacity gained from a new segment
    pub fn record_segment(&self, usable: Size) {
        let mut inner = self.inner.write();
        inner.total_memory += usable;
        inner.segment_count += 1;
        inner.touch();
    }

    /// Record a growth event (the segment itself goes through `record_segment`)
    pub fn record_growth(&self) {
        let mut inner = self.inner.write();
        inner.growth_events += 1;
        inner.touch();
    }

    pub fn record_allocation(&self, block_size: Size, requested: Size, duration: Duration) {
        let nanos = duration_nanos(duration);
        let mut inner = self.inner.write();

        inner.allocation_count += 1;
        inner.live_blocks += 1;
        inner.used_memory += block_size;
        inner.requested_memory += requested;
        inner.alloc_latency.observe(nanos);

        inner.peak_memory_usage = inner.peak_memory_usage.max(inner.used_memory);
        inner.peak_live_blocks = inner.peak_live_blocks.max(inner.live_blocks);
        *inner.block_size_distribution.entry(block_size).or_insert(0) += 1;
        inner.touch();
    }

    pub fn record_deallocation(&self, block_size: Size, requested: Size, duration: Duration) {
        let nanos = duration_nanos(duration);
        let mut inner = self.inner.write();

        inner.deallocation_count += 1;
        inner.live_blocks = inner.live_blocks.saturating_sub(1);
        inner.used_memory = inner.used_memory.saturating_sub(block_size);
        inner.requested_memory = inner.requested_memory.saturating_sub(requested);
        inner.dealloc_latency.observe(nanos);
        inner.touch();
    }

    pub fn record_allocation_failure(&self) {
        let mut inner = self.inner.write();
        inner.allocation_failures += 1;
        inner.touch();
    }

    pub fn record_deallocation_failure(&self) {
        let mut inner = self.inner.write();
        inner.deallocation_failures += 1;
        inner.touch();
    }

    pub fn record_invalid_pointer(&self) {
        let mut inner = self.inner.write();
        inner.invalid_pointer_errors += 1;
        inner.touch();
    }

    /// One block split into two buddies
    pub fn record_split(&self) {
        let mut inner = self.inner.write();
        inner.fragment_count += 1;
        inner.touch();
    }

    /// Two buddies merged into their parent
    pub fn record_merge(&self) {
        let mut inner = self.inner.write();
        inner.fragment_count = inner.fragment_count.saturating_sub(1);
        inner.touch();
    }

    /// Zero every counter, keeping the capacity and segment count given
    pub fn reset(&self, total_memory: Size, segment_count: usize) {
        *self.inner.write() = StatsInner::new(total_memory, segment_count);
    }

    /// Zero the event counters, keeping capacity, live usage and split depth
    pub fn reset_counters(&self) {
        let mut inner = self.inner.write();
        let (total, segments, used, live, requested, fragments) = (
            inner.total_memory,
            inner.segment_count,
            inner.used_memory,
            inner.live_blocks,
            inner.requested_memory,
            inner.fragment_count,
        );
        *inner = StatsInner::new(total, segments);
        // Outstanding allocations remain live; keep usage truthful
        inner.used_memory = used;
        inner.live_blocks = live;
        inner.requested_memory = requested;
        inner.fragment_count = fragments;
        inner.peak_memory_usage = used;
        inner.peak_live_blocks = live;
    }

    pub fn total_memory(&self) -> Size {
        self.inner.read().total_memory
    }

    pub fn used_memory(&self) -> Size {
        self.inner.read().used_memory
    }

    pub fn fragment_count(&self) -> u64 {
        self.inner.read().fragment_count
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.read();
        StatsSnapshot {
            total_memory: inner.total_memory,
            used_memory: inner.used_memory,
            free_memory: inner.free_memory(),
            requested_memory: inner.requested_memory,
            allocation_count: inner.allocation_count,
            deallocation_count: inner.deallocation_count,
            live_blocks: inner.live_blocks,
            peak_live_blocks: inner.peak_live_blocks,
            peak_memory_usage: inner.peak_memory_usage,
            fragment_count: inner.fragment_count,
            allocation_failures: inner.allocation_failures,
            deallocation_failures: inner.deallocation_failures,
            invalid_pointer_errors: inner.invalid_pointer_errors,
            growth_events: inner.growth_events,
            segment_count: inner.segment_count,
            total_alloc_time_ns: inner.alloc_latency.sum,
            total_dealloc_time_ns: inner.dealloc_latency.sum,
            max_alloc_time_ns: inner.alloc_latency.max,
            max_dealloc_time_ns: inner.dealloc_latency.max,
            block_size_distribution: inner.block_size_distribution.clone(),
            uptime_secs: inner.created_at.elapsed().as_secs_f64(),
        }
    }

    pub fn memory_usage(&self) -> MemoryUsage {
        let inner = self.inner.read();
        MemoryUsage {
            total: inner.total_memory,
            used: inner.used_memory,
            free: inner.free_memory(),
            usage_percent: inner.usage_percent(),
        }
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let inner = self.inner.read();
        PerformanceMetrics {
            avg_alloc_time_ns: inner.alloc_latency.mean(),
            avg_dealloc_time_ns: inner.dealloc_latency.mean(),
            max_alloc_time_ns: inner.alloc_latency.max,
            max_dealloc_time_ns: inner.dealloc_latency.max,
            p50_alloc_time_ns: inner.alloc_latency.percentile(0.50),
            p99_alloc_time_ns: inner.alloc_latency.percentile(0.99),
            p50_dealloc_time_ns: inner.dealloc_latency.percentile(0.50),
            p99_dealloc_time_ns: inner.dealloc_latency.percentile(0.99),
            allocation_count: inner.allocation_count,
            deallocation_count: inner.deallocation_count,
        }
    }

    pub fn error_stats(&self) -> ErrorStats {
        let inner = self.inner.read();
        ErrorStats {
            allocation_failures: inner.allocation_failures,
            deallocation_failures: inner.deallocation_failures,
            invalid_pointer_errors: inner.invalid_pointer_errors,
            alloc_failure_rate: inner.alloc_failure_rate(),
            dealloc_failure_rate: inner.dealloc_failure_rate(),
        }
    }

    pub fn health_report(&self) -> HealthReport {
        let inner = self.inner.read();
        let fragmentation_rate = inner.fragmentation_rate(self.min_block_size);
        let error_rate = (inner.alloc_failure_rate() + inner.dealloc_failure_rate()) * 100.0;

        let (status, message) =
            if error_rate > CRITICAL_ERROR_RATE || fragmentation_rate > CRITICAL_FRAGMENTATION_RATE {
                (HealthStatus::Critical, "Memory pool is in critical condition")
            } else if error_rate > WARNING_ERROR_RATE
                || fragmentation_rate > WARNING_FRAGMENTATION_RATE
            {
                (HealthStatus::Warning, "Memory pool has warnings")
            } else {
                (HealthStatus::Healthy, "Memory pool is healthy")
            };

        HealthReport {
            status,
            message: message.to_string(),
            fragmentation_rate,
            memory_usage: inner.usage_percent(),
            error_rate,
        }
    }

    /// Human-readable summary
    pub fn summary(&self) -> String {
        let inner = self.inner.read();
        let mut out = String::new();

        // Writing to a String cannot fail
        let _ = writeln!(out, "Memory Pool Statistics:");
        let _ = writeln!(out, "  Total Memory: {} bytes", inner.total_memory);
        let _ = writeln!(
            out,
            "  Used Memory: {} bytes ({:.2}%)",
            inner.used_memory,
            inner.usage_percent()
        );
        let _ = writeln!(out, "  Free Memory: {} bytes", inner.free_memory());
        let _ = writeln!(out, "  Peak Usage: {} bytes", inner.peak_memory_usage);
        let _ = writeln!(
            out,
            "  Segments: {} ({} growth events)",
            inner.segment_count, inner.growth_events
        );
        let _ = writeln!(out, "  Allocations: {}", inner.allocation_count);
        let _ = writeln!(out, "  Deallocations: {}", inner.deallocation_count);
        let _ = writeln!(out, "  Live Blocks: {}", inner.live_blocks);
        let _ = writeln!(
            out,
            "  Fragments: {} ({:.2}%)",
            inner.fragment_count,
            inner.fragmentation_rate(self.min_block_size)
        );
        let _ = writeln!(
            out,
            "  Allocation Failures: {} ({:.2}%)",
            inner.allocation_failures,
            inner.alloc_failure_rate() * 100.0
        );
        let _ = writeln!(
            out,
            "  Deallocation Failures: {} ({:.2}%)",
            inner.deallocation_failures,
            inner.dealloc_failure_rate() * 100.0
        );
        let _ = writeln!(out, "  Invalid Pointers: {}", inner.invalid_pointer_errors);
        let _ = writeln!(
            out,
            "  Average Alloc Time: {:.1} ns (p99 {} ns)",
            inner.alloc_latency.mean(),
            inner.alloc_latency.percentile(0.99)
        );
        let _ = writeln!(
            out,
            "  Average Dealloc Time: {:.1} ns (p99 {} ns)",
            inner.dealloc_latency.mean(),
            inner.dealloc_latency.percentile(0.99)
        );
        if !inner.block_size_distribution.is_empty() {
            let _ = writeln!(out, "  Block Size Distribution:");
            for (size, count) in &inner.block_size_distribution {
                let _ = writeln!(out, "    {:>8} bytes: {}", size, count);
            }
        }
        let _ = writeln!(
            out,
            "  Uptime: {:.3} seconds",
            inner.created_at.elapsed().as_secs_f64()
        );
        let _ = write!(
            out,
            "  Last Access: {:.3} seconds ago",
            inner.last_access.elapsed().as_secs_f64()
        );

        out
    }
}

#[inline]
fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

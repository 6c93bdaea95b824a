/*!
 * Statistics Tests
 * Counters, reports and serialized snapshots
 */

use buddy_pool::memory::{HealthStatus, MemoryPool, PoolConfig, PoolReporting, StatsSnapshot};
use pretty_assertions::assert_eq;

fn pool() -> MemoryPool {
    MemoryPool::new(
        PoolConfig::default()
            .with_initial_size(8192)
            .with_block_sizes(16, 4096),
    )
    .expect("valid config")
}

#[test]
fn test_usage_tracks_block_sizes() {
    let pool = pool();
    let a = pool.allocate(100).unwrap().unwrap();
    let b = pool.allocate(1000).unwrap().unwrap();

    let usage = pool.get_memory_usage();
    assert_eq!(usage.total, 8192);
    assert_eq!(usage.used, 128 + 1024);
    assert_eq!(usage.free, 8192 - 1152);

    let stats = pool.get_stats();
    assert_eq!(stats.requested_memory, 1100);
    assert_eq!(stats.internal_waste(), 52);
    assert_eq!(stats.live_blocks, 2);
    assert_eq!(stats.block_size_distribution.get(&128), Some(&1));
    assert_eq!(stats.block_size_distribution.get(&1024), Some(&1));

    pool.deallocate(a).unwrap();
    pool.deallocate(b).unwrap();
    let stats = pool.get_stats();
    assert_eq!(stats.used_memory, 0);
    assert_eq!(stats.peak_memory_usage, 1152);
    assert_eq!(stats.peak_live_blocks, 2);
}

#[test]
fn test_performance_metrics_counts() {
    let pool = pool();
    for _ in 0..10 {
        let addr = pool.allocate(64).unwrap().unwrap();
        pool.deallocate(addr).unwrap();
    }

    let metrics = pool.get_performance_metrics();
    assert_eq!(metrics.allocation_count, 10);
    assert_eq!(metrics.deallocation_count, 10);
    assert!(metrics.p99_alloc_time_ns >= metrics.p50_alloc_time_ns);
    assert!(metrics.avg_alloc_time_ns <= metrics.max_alloc_time_ns as f64);
}

#[test]
fn test_reset_keeps_capacity_only() {
    let pool = pool();
    pool.allocate(10).unwrap().unwrap();
    let _ = pool.deallocate(1);

    pool.reset();

    let stats = pool.get_stats();
    assert_eq!(stats.total_memory, 8192);
    assert_eq!(stats.used_memory, 0);
    assert_eq!(stats.allocation_count, 0);
    assert_eq!(stats.deallocation_failures, 0);
}

#[test]
fn test_reset_stats_keeps_live_usage() {
    let pool = pool();
    let addr = pool.allocate(200).unwrap().unwrap();

    pool.reset_stats();
    let stats = pool.get_stats();
    assert_eq!(stats.allocation_count, 0);
    assert_eq!(stats.used_memory, 256);

    pool.deallocate(addr).unwrap();
    assert_eq!(pool.get_stats().used_memory, 0);
}

#[test]
fn test_health_degrades_with_errors() {
    let pool = pool();
    assert_eq!(pool.get_health_report().status, HealthStatus::Healthy);
    assert!(pool.is_healthy());

    pool.allocate(16).unwrap().unwrap();
    for _ in 0..3 {
        let _ = pool.allocate(1 << 30);
    }

    let report = pool.health();
    assert_eq!(report.status, HealthStatus::Critical);
    assert!(report.error_rate > 10.0);
}

#[test]
fn test_trait_info_matches_usage() {
    let pool = pool();
    pool.allocate(512).unwrap().unwrap();
    assert_eq!(pool.info(), (8192, 512, 8192 - 512));
}

#[test]
fn test_snapshot_serializes() {
    let pool = pool();
    pool.allocate(48).unwrap().unwrap();

    let json = serde_json::to_string(&pool.get_stats()).unwrap();
    let back: StatsSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.used_memory, 64);
    assert_eq!(back.allocation_count, 1);

    let report = serde_json::to_value(pool.get_health_report()).unwrap();
    assert_eq!(report["status"], "Healthy");
}

#[test]
fn test_detailed_report() {
    let pool = pool();
    pool.allocate(16).unwrap().unwrap();

    let report = pool.get_detailed_report();
    assert!(report.contains("Total Memory: 8192 bytes"));
    assert!(report.contains("Allocations: 1"));
    assert!(report.contains("Free Blocks by Size Class:"));
}

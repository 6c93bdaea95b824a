/*!
 * Buddy Pool - Demo Entry Point
 *
 * Walks a pool through allocation, typed arrays, guarded blocks, reporting,
 * reset and the error strategies.
 */

use anyhow::{Context, Result};
use tracing::{info, warn};

use buddy_pool::{init_tracing, ErrorStrategy, MemoryPool, PoolConfig};

fn main() -> Result<()> {
    init_tracing();

    info!("Buddy pool demo starting...");
    info!("================================================");

    let config = match std::env::var("POOL_CONFIG") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading pool config {path}"))?;
            PoolConfig::from_json(&json)?
        }
        Err(_) => PoolConfig::default(),
    };
    let pool = MemoryPool::new(config).context("creating memory pool")?;

    basic_allocation(&pool)?;
    typed_allocation(&pool)?;
    safe_allocation(&pool);
    report(&pool)?;
    reset(&pool)?;
    error_strategies(&pool)?;

    info!("Buddy pool demo finished");
    Ok(())
}

fn basic_allocation(pool: &MemoryPool) -> Result<()> {
    info!("=== Basic allocation ===");

    let mut addresses = Vec::new();
    for size in [100, 1024, 10 * 1024] {
        let addr = pool.allocate(size)?.context("allocation returned null")?;
        info!(
            size,
            address = format_args!("{:#x}", addr),
            block_size = ?pool.get_block_size(addr),
            "allocated"
        );
        addresses.push(addr);
    }

    for addr in addresses {
        pool.deallocate(addr)?;
        info!(address = format_args!("{:#x}", addr), "released");
    }
    Ok(())
}

fn typed_allocation(pool: &MemoryPool) -> Result<()> {
    info!("=== Typed allocation ===");

    let addr = pool
        .allocate_array::<i32>(10)?
        .context("array allocation returned null")?;

    let squares: Vec<u8> = (0..10i32).flat_map(|i| (i * i).to_le_bytes()).collect();
    pool.write_bytes(addr, &squares)?;

    let values: Vec<i32> = pool
        .read_bytes(addr, squares.len())?
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    info!(?values, "array contents");

    pool.deallocate(addr)?;

    let block = pool
        .allocate_guard(256)?
        .context("guarded allocation returned null")?;
    block.write(b"scoped")?;
    info!(?block, "guarded block in use");
    drop(block);
    Ok(())
}

fn safe_allocation(pool: &MemoryPool) {
    info!("=== Safe allocation ===");

    match pool.safe_allocate(100 * 1024 * 1024) {
        Some(addr) => {
            info!(address = format_args!("{:#x}", addr), "oversized allocation succeeded");
            pool.safe_deallocate(addr);
        }
        None => info!("oversized allocation returned null"),
    }
}

fn report(pool: &MemoryPool) -> Result<()> {
    info!("=== Pool status ===");

    let usage = pool.get_memory_usage();
    info!(
        total = usage.total,
        used = usage.used,
        free = usage.free,
        usage_percent = usage.usage_percent,
        "memory usage"
    );

    let metrics = pool.get_performance_metrics();
    info!(
        avg_alloc_ns = metrics.avg_alloc_time_ns,
        avg_dealloc_ns = metrics.avg_dealloc_time_ns,
        p99_alloc_ns = metrics.p99_alloc_time_ns,
        allocations = metrics.allocation_count,
        deallocations = metrics.deallocation_count,
        "performance"
    );

    let health = pool.get_health_report();
    info!(
        status = %health.status,
        message = %health.message,
        fragmentation_rate = health.fragmentation_rate,
        error_rate = health.error_rate,
        "health"
    );

    println!("{}", pool.get_detailed_report());
    println!("{}", serde_json::to_string_pretty(&pool.get_stats())?);
    Ok(())
}

fn reset(pool: &MemoryPool) -> Result<()> {
    info!("=== Reset ===");

    for i in 1..=5 {
        pool.allocate(i * 100)?;
    }
    let before = pool.get_stats();
    info!(used = before.used_memory, allocations = before.allocation_count, "before reset");

    pool.reset();

    let after = pool.get_stats();
    info!(used = after.used_memory, allocations = after.allocation_count, "after reset");
    Ok(())
}

fn error_strategies(pool: &MemoryPool) -> Result<()> {
    info!("=== Error handling ===");

    pool.set_error_handling_strategy(ErrorStrategy::ReturnNull);
    if pool.allocate(100 * 1024 * 1024)?.is_none() {
        info!("return-null strategy suppressed the failure");
    }

    pool.set_error_logger(|message| warn!(logged = message, "pool error logged"));
    pool.set_error_handling_strategy(ErrorStrategy::LogAndContinue);
    pool.deallocate(0xdead_beef)?;

    pool.set_error_handling_strategy(ErrorStrategy::Propagate);
    match pool.deallocate(0xdead_beef) {
        Ok(()) => warn!("invalid pointer was accepted"),
        Err(e) => info!(kind = %e.kind(), error = %e, "propagate strategy returned the error"),
    }

    let errors = pool.get_error_stats();
    info!(
        allocation_failures = errors.allocation_failures,
        deallocation_failures = errors.deallocation_failures,
        invalid_pointers = errors.invalid_pointer_errors,
        "error statistics"
    );
    Ok(())
}

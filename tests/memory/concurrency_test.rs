/*!
 * Concurrency Tests
 * Parallel allocate/deallocate pairs must leave the pool as sequential use would
 */

use buddy_pool::memory::{MemoryPool, PoolConfig};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PAIRS: usize = 500;

fn shared_pool() -> Arc<MemoryPool> {
    Arc::new(
        MemoryPool::new(
            PoolConfig::default()
                .with_initial_size(256 * 1024)
                .with_block_sizes(16, 64 * 1024),
        )
        .expect("valid config"),
    )
}

#[test]
fn test_parallel_pairs_balance() {
    let pool = shared_pool();
    let initial = pool.free_block_counts();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = pool.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t as u64);
                barrier.wait();
                for _ in 0..PAIRS {
                    let size = rng.gen_range(1..=2048);
                    let addr = pool.allocate(size).unwrap().unwrap();
                    assert!(pool.get_block_size(addr).unwrap() >= size);
                    pool.deallocate(addr).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker panicked");
    }

    let stats = pool.get_stats();
    assert_eq!(stats.allocation_count, (THREADS * PAIRS) as u64);
    assert_eq!(stats.deallocation_count, (THREADS * PAIRS) as u64);
    assert_eq!(stats.used_memory, 0);
    assert_eq!(stats.live_blocks, 0);
    assert_eq!(stats.allocation_failures, 0);
    assert_eq!(pool.free_block_counts(), initial);
}

#[test]
fn test_parallel_live_blocks_are_disjoint() {
    let pool = shared_pool();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let pool = pool.clone();
            thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(100 + t as u64);
                (0..64)
                    .map(|_| {
                        let addr = pool.allocate(rng.gen_range(16..=512)).unwrap().unwrap();
                        pool.write_bytes(addr, &[t as u8; 16]).unwrap();
                        addr
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let per_thread: Vec<Vec<usize>> = handles
        .into_iter()
        .map(|h| h.join().expect("worker panicked"))
        .collect();

    // Every block still holds its owner's tag
    for (t, addrs) in per_thread.iter().enumerate() {
        for &addr in addrs {
            assert_eq!(pool.read_bytes(addr, 16).unwrap(), vec![t as u8; 16]);
        }
    }

    let mut all: Vec<(usize, usize)> = per_thread
        .iter()
        .flatten()
        .map(|&addr| (addr, pool.get_block_size(addr).unwrap()))
        .collect();
    all.sort_unstable();
    for pair in all.windows(2) {
        assert!(pair[0].0 + pair[0].1 <= pair[1].0);
    }

    for addr in per_thread.into_iter().flatten() {
        pool.deallocate(addr).unwrap();
    }
    assert_eq!(pool.get_stats().used_memory, 0);
}

#[test]
fn test_readers_during_mutation() {
    let pool = shared_pool();
    let writer = {
        let pool = pool.clone();
        thread::spawn(move || {
            for i in 0..1000 {
                let addr = pool.allocate(16 + i % 1000).unwrap().unwrap();
                pool.deallocate(addr).unwrap();
            }
        })
    };

    for _ in 0..200 {
        let usage = pool.get_memory_usage();
        assert!(usage.used <= usage.total);
        let _ = pool.get_health_report();
    }
    writer.join().expect("writer panicked");
}

#[test]
fn test_unsynchronized_pool_from_one_thread() {
    let pool = MemoryPool::new(PoolConfig::default().with_thread_safe(false)).unwrap();
    assert!(!pool.is_thread_safe());

    let addr = pool.allocate(64).unwrap().unwrap();
    pool.deallocate(addr).unwrap();

    pool.set_thread_safe(true);
    assert!(pool.is_thread_safe());
}

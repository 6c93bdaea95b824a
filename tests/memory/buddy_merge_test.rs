/*!
 * Buddy Merge Test
 * Verifies splitting and coalescing restore the free-list state
 */

use buddy_pool::memory::{MemoryPool, PoolConfig};
use pretty_assertions::assert_eq;

fn pool(initial: usize) -> MemoryPool {
    MemoryPool::new(
        PoolConfig::default()
            .with_initial_size(initial)
            .with_block_sizes(32, 4096),
    )
    .expect("valid config")
}

#[test]
fn test_alloc_free_is_identity_on_fresh_pool() {
    let pool = pool(16 * 1024);
    let before = pool.free_block_counts();

    for size in [32, 100, 700, 4096, 2049] {
        let addr = pool.allocate(size).unwrap().unwrap();
        pool.deallocate(addr).unwrap();
        assert_eq!(pool.free_block_counts(), before, "after {} bytes", size);
    }
    assert_eq!(pool.get_stats().fragment_count, 0);
}

#[test]
fn test_split_children_merge_back() {
    let pool = pool(4096);

    // First 2048 request splits the 4096 block; the second takes the buddy
    let lower = pool.allocate(2048).unwrap().unwrap();
    let upper = pool.allocate(2048).unwrap().unwrap();
    assert_eq!(lower ^ 2048, upper);
    assert_eq!(pool.get_stats().fragment_count, 1);

    pool.deallocate(upper).unwrap();
    pool.deallocate(lower).unwrap();

    let counts = pool.free_block_counts();
    assert_eq!(counts.last(), Some(&(4096, 1)));
    assert!(counts[..counts.len() - 1].iter().all(|&(_, n)| n == 0));
    assert_eq!(pool.get_stats().fragment_count, 0);
}

#[test]
fn test_non_buddies_stay_apart() {
    let pool = pool(4096);
    let blocks: Vec<usize> = (0..4).map(|_| pool.allocate(1024).unwrap().unwrap()).collect();
    let mut sorted = blocks.clone();
    sorted.sort_unstable();

    // Adjacent but from different parents: [1] and [2]
    pool.deallocate(sorted[1]).unwrap();
    pool.deallocate(sorted[2]).unwrap();
    assert_eq!(pool.free_block_counts()[5], (1024, 2));
    assert_eq!(pool.free_block_counts()[6], (2048, 0));

    pool.deallocate(sorted[0]).unwrap();
    pool.deallocate(sorted[3]).unwrap();
    assert_eq!(pool.free_block_counts()[7], (4096, 1));
}

#[test]
fn test_full_cycle_returns_all_capacity() {
    let pool = pool(32 * 1024);

    let addrs: Vec<usize> = (1..=60)
        .filter_map(|i| pool.allocate(i * 33).unwrap())
        .collect();
    for addr in addrs.into_iter().rev() {
        pool.deallocate(addr).unwrap();
    }

    // Growth may have added segments; everything must still be free
    assert_eq!(pool.free_capacity(), pool.get_memory_usage().total);
    assert_eq!(pool.get_stats().used_memory, 0);
}

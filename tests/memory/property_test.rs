/*!
 * Property Tests
 * Randomized allocation sequences keep the pool accounting consistent
 */

use buddy_pool::memory::{MemoryPool, PoolConfig};
use proptest::prelude::*;

const MIN: usize = 16;
const MAX: usize = 4096;

fn pool() -> MemoryPool {
    MemoryPool::new(
        PoolConfig::default()
            .with_initial_size(16 * 1024)
            .with_block_sizes(MIN, MAX),
    )
    .expect("valid config")
}

#[derive(Debug, Clone)]
enum Op {
    Alloc(usize),
    Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1..=MAX).prop_map(Op::Alloc),
        2 => any::<usize>().prop_map(Op::Free),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_block_size_is_class_of_request(size in 1..=MAX) {
        let pool = pool();
        let addr = pool.allocate(size).unwrap().unwrap();
        let block = pool.get_block_size(addr).unwrap();

        prop_assert_eq!(block, size.max(MIN).next_power_of_two());
        prop_assert_eq!(addr % block, 0);
        prop_assert!(pool.is_valid_pointer(addr));
    }

    #[test]
    fn prop_random_ops_keep_accounting(ops in prop::collection::vec(op(), 1..120)) {
        let pool = pool();
        let mut live: Vec<(usize, usize)> = Vec::new();

        for op in ops {
            match op {
                Op::Alloc(size) => {
                    let addr = pool.allocate(size).unwrap().unwrap();
                    live.push((addr, pool.get_block_size(addr).unwrap()));
                }
                Op::Free(pick) if !live.is_empty() => {
                    let (addr, _) = live.swap_remove(pick % live.len());
                    pool.deallocate(addr).unwrap();
                }
                Op::Free(_) => {}
            }

            let used: usize = live.iter().map(|&(_, size)| size).sum();
            let usage = pool.get_memory_usage();
            prop_assert_eq!(usage.used, used);
            prop_assert_eq!(pool.free_capacity() + used, usage.total);
        }

        for (addr, _) in live {
            pool.deallocate(addr).unwrap();
        }
        prop_assert_eq!(pool.free_capacity(), pool.get_memory_usage().total);
        prop_assert_eq!(pool.get_stats().fragment_count, 0);
    }
}

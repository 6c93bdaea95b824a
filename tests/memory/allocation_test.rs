/*!
 * Allocation Tests
 * Size classing, address validity and byte access through the public API
 */

use buddy_pool::memory::{MemoryPool, PoolConfig, PoolError};
use buddy_pool::NULL_ADDRESS;
use pretty_assertions::assert_eq;

fn pool() -> MemoryPool {
    MemoryPool::new(
        PoolConfig::default()
            .with_initial_size(64 * 1024)
            .with_block_sizes(16, 16 * 1024),
    )
    .expect("valid config")
}

#[test]
fn test_allocation_rounds_to_power_of_two() {
    let pool = pool();

    for (request, expected) in [(1, 16), (16, 16), (17, 32), (100, 128), (1000, 1024), (16 * 1024, 16 * 1024)] {
        let addr = pool.allocate(request).unwrap().expect("non-null");
        assert!(pool.is_valid_pointer(addr));
        assert_eq!(pool.get_block_size(addr), Some(expected), "request {}", request);
        assert_eq!(addr % expected, 0, "block not aligned to its size");
    }
}

#[test]
fn test_zero_size_is_null_and_not_a_failure() {
    let pool = pool();
    assert_eq!(pool.allocate(0).unwrap(), None);
    assert_eq!(pool.safe_allocate(0), None);
    assert_eq!(pool.get_error_stats().allocation_failures, 0);
}

#[test]
fn test_oversized_request() {
    let pool = pool();
    let err = pool.allocate(16 * 1024 + 1).unwrap_err();

    assert!(matches!(err, PoolError::OutOfMemory { .. }));
    assert_eq!(pool.get_error_stats().allocation_failures, 1);
    assert_eq!(pool.get_stats().used_memory, 0);
}

#[test]
fn test_distinct_live_blocks_never_overlap() {
    let pool = pool();
    let mut blocks: Vec<(usize, usize)> = (0..40)
        .map(|i| {
            let addr = pool.allocate(24 + i * 37).unwrap().unwrap();
            (addr, pool.get_block_size(addr).unwrap())
        })
        .collect();

    blocks.sort_unstable();
    for pair in blocks.windows(2) {
        assert!(pair[0].0 + pair[0].1 <= pair[1].0, "{:?} overlaps", pair);
    }
}

#[test]
fn test_foreign_and_null_addresses() {
    let pool = pool();
    assert!(!pool.is_valid_pointer(NULL_ADDRESS));
    assert!(!pool.is_valid_pointer(3));
    assert_eq!(pool.get_block_size(3), None);

    assert_eq!(pool.deallocate(3), Err(PoolError::InvalidPointer(3)));
    assert_eq!(pool.get_error_stats().invalid_pointer_errors, 1);
    assert_eq!(pool.get_error_stats().deallocation_failures, 1);
}

#[test]
fn test_byte_access_round_trip() {
    let pool = pool();
    let addr = pool.allocate(512).unwrap().unwrap();
    let payload: Vec<u8> = (0..=255).collect();

    pool.write_bytes(addr + 100, &payload).unwrap();
    assert_eq!(pool.read_bytes(addr + 100, 256).unwrap(), payload);
    assert_eq!(pool.read_bytes(addr, 4).unwrap(), vec![0; 4]);
}

#[test]
fn test_fresh_blocks_are_zeroed_after_reset() {
    let pool = pool();
    let addr = pool.allocate(64).unwrap().unwrap();
    pool.write_bytes(addr, &[0xAB; 64]).unwrap();

    pool.reset();

    let again = pool.allocate(64).unwrap().unwrap();
    assert_eq!(pool.read_bytes(again, 64).unwrap(), vec![0; 64]);
}

#[test]
fn test_allocate_array_layout() {
    let pool = pool();
    let addr = pool.allocate_array::<u128>(3).unwrap().unwrap();

    assert_eq!(pool.get_block_size(addr), Some(64));
    assert_eq!(addr % std::mem::align_of::<u128>(), 0);
    assert_eq!(pool.allocate_array::<u8>(0).unwrap(), None);
}

#[test]
fn test_handles_from_before_reset_stay_invalid() {
    let pool = pool();
    let stale = pool.allocate(64).unwrap().unwrap();

    pool.reset();
    let fresh = pool.allocate(64).unwrap().unwrap();

    assert_eq!(pool.deallocate(stale), Err(PoolError::InvalidPointer(stale)));
    assert!(pool.read_bytes(stale, 1).is_err());
    assert!(pool.is_allocated(fresh));
    assert_eq!(pool.get_block_size(fresh), Some(64));
}

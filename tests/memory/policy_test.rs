/*!
 * Error Policy Tests
 * Strategy switching and logger callbacks on a live pool
 */

use buddy_pool::memory::{ErrorKind, ErrorStrategy, MemoryPool, PoolConfig, PoolError};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn pool(strategy: ErrorStrategy) -> MemoryPool {
    MemoryPool::new(
        PoolConfig::default()
            .with_initial_size(4096)
            .with_block_sizes(16, 1024)
            .with_error_strategy(strategy),
    )
    .expect("valid config")
}

#[test]
fn test_propagate_returns_errors() {
    let pool = pool(ErrorStrategy::Propagate);

    let err = pool.allocate(1 << 20).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfMemory);

    let err = pool.deallocate(0x10).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidPointer);
}

#[test]
fn test_return_null_suppresses() {
    let pool = pool(ErrorStrategy::ReturnNull);

    assert_eq!(pool.allocate(1 << 20), Ok(None));
    assert_eq!(pool.deallocate(0x10), Ok(()));

    // Suppressed failures are still counted
    let errors = pool.get_error_stats();
    assert_eq!(errors.allocation_failures, 1);
    assert_eq!(errors.deallocation_failures, 1);
}

#[test]
fn test_log_and_continue_invokes_logger() {
    let pool = pool(ErrorStrategy::LogAndContinue);
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    pool.set_error_logger(move |message| sink.lock().push(message.to_string()));

    assert_eq!(pool.allocate(1 << 20), Ok(None));
    assert_eq!(pool.deallocate(0x10), Ok(()));

    let logged = messages.lock();
    assert_eq!(logged.len(), 2);
    assert!(logged[1].contains("0x10"));

    drop(logged);
    pool.clear_error_logger();
    pool.allocate(1 << 20).unwrap();
    assert_eq!(messages.lock().len(), 2);
}

#[test]
fn test_strategy_switch_at_runtime() {
    let pool = pool(ErrorStrategy::Propagate);
    assert!(pool.allocate(1 << 20).is_err());

    pool.set_error_handling_strategy(ErrorStrategy::ReturnNull);
    assert_eq!(pool.error_handling_strategy(), ErrorStrategy::ReturnNull);
    assert_eq!(pool.allocate(1 << 20), Ok(None));

    pool.set_error_handling_strategy(ErrorStrategy::Propagate);
    assert!(matches!(pool.allocate(1 << 20), Err(PoolError::OutOfMemory { .. })));
}

#[test]
fn test_safe_calls_ignore_propagate() {
    let pool = pool(ErrorStrategy::Propagate);
    assert_eq!(pool.safe_allocate(1 << 20), None);
    assert!(!pool.safe_deallocate(0x10));
    assert_eq!(pool.get_error_stats().allocation_failures, 1);
}

#[test]
fn test_config_errors_ignore_strategy() {
    let err = MemoryPool::new(
        PoolConfig::default()
            .with_block_sizes(100, 1024)
            .with_error_strategy(ErrorStrategy::ReturnNull),
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidAlignment);

    let err = MemoryPool::new(PoolConfig::default().with_growth_factor(0.5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

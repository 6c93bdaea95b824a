/*!
 * Pool Lock
 *
 * Scoped acquisition of the pool-wide state lock. Guards release on every
 * exit path, including `?` returns and unwinding, so the error policy always
 * runs with the lock dropped.
 */

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Pool-wide lock with a runtime thread-safety switch
///
/// With thread safety disabled the caller promises single-threaded use. The
/// guard is then taken with a non-blocking attempt; contention means that
/// promise was broken, which is logged before falling back to blocking so the
/// state stays consistent.
#[derive(Debug)]
pub struct PoolLock<T> {
    state: Mutex<T>,
    thread_safe: AtomicBool,
}

impl<T> PoolLock<T> {
    pub fn new(state: T, thread_safe: bool) -> Self {
        Self {
            state: Mutex::new(state),
            thread_safe: AtomicBool::new(thread_safe),
        }
    }

    #[inline]
    pub fn thread_safe(&self) -> bool {
        self.thread_safe.load(Ordering::Acquire)
    }

    /// Toggle the switch while holding the lock so no operation straddles it
    pub fn set_thread_safe(&self, enabled: bool) {
        let _guard = self.state.lock();
        self.thread_safe.store(enabled, Ordering::Release);
    }

    pub fn acquire(&self) -> MutexGuard<'_, T> {
        if self.thread_safe() {
            return self.state.lock();
        }

        match self.state.try_lock() {
            Some(guard) => guard,
            None => {
                warn!("concurrent access to a pool configured without thread safety");
                self.state.lock()
            }
        }
    }

    /// Exclusive access without locking
    #[cfg(test)]
    pub fn get_mut(&mut self) -> &mut T {
        self.state.get_mut()
    }
}

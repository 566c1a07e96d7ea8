// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
A small re-entrant mutex.

The sink registry, the dispatch engine, and the crash handler all serialize
on one lock, and a sink callback may log again while the dispatching thread
already holds it. A thread that owns the lock may therefore re-acquire it
freely; distinct threads contend normally.

Re-entrancy means the guard can only hand out `&T`; the protected data uses
interior mutability (`Cell`/`RefCell`) for its mutation points. The lock is
held for as short a time as logging allows, but note that it covers sink
callbacks by design.
*/

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Relaxed);
}

pub(crate) fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

const UNOWNED: u64 = 0;

pub struct ReentrantMutex<T> {
    /// Thread id of the current owner, or `UNOWNED`.
    owner: AtomicU64,
    /// Recursion depth. Only ever touched by the owning thread.
    recursion: UnsafeCell<u64>,
    data: T,
}

// Safety: the owner/recursion protocol guarantees at most one thread
// accesses `data` and `recursion` at a time; `T: Send` is enough because
// access moves between threads but never overlaps.
unsafe impl<T: Send> Send for ReentrantMutex<T> {}
unsafe impl<T: Send> Sync for ReentrantMutex<T> {}

impl<T> ReentrantMutex<T> {
    pub const fn new(data: T) -> Self {
        Self {
            owner: AtomicU64::new(UNOWNED),
            recursion: UnsafeCell::new(0),
            data,
        }
    }

    /// Acquires the lock, spinning if another thread owns it. Re-entrant
    /// acquisition by the owning thread always succeeds immediately.
    pub fn lock(&self) -> ReentrantMutexGuard<'_, T> {
        let me = current_thread_id();
        if self.owner.load(Relaxed) == me {
            // Already owned by us; just bump the depth.
            // Safety: only the owning thread touches `recursion`.
            unsafe { *self.recursion.get() += 1 };
        } else {
            while self
                .owner
                .compare_exchange_weak(UNOWNED, me, Acquire, Relaxed)
                .is_err()
            {
                std::hint::spin_loop();
                std::thread::yield_now();
            }
            // Safety: we just became the owner.
            unsafe { *self.recursion.get() = 1 };
        }
        ReentrantMutexGuard {
            lock: self,
            _not_send: PhantomData,
        }
    }
}

/// Guard returned by [`ReentrantMutex::lock`]. Releases one level of
/// ownership on drop.
pub struct ReentrantMutexGuard<'a, T> {
    lock: &'a ReentrantMutex<T>,
    /// The guard must be dropped on the acquiring thread.
    _not_send: PhantomData<*const ()>,
}

impl<T> Deref for ReentrantMutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.lock.data
    }
}

impl<T> Drop for ReentrantMutexGuard<'_, T> {
    fn drop(&mut self) {
        // Safety: we are the owning thread.
        unsafe {
            let recursion = self.lock.recursion.get();
            *recursion -= 1;
            if *recursion == 0 {
                self.lock.owner.store(UNOWNED, Release);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn reentrant_on_one_thread() {
        let lock = ReentrantMutex::new(Cell::new(0));
        let outer = lock.lock();
        {
            let inner = lock.lock();
            inner.set(inner.get() + 1);
        }
        outer.set(outer.get() + 1);
        drop(outer);
        assert_eq!(lock.lock().get(), 2);
    }

    #[test]
    fn excludes_other_threads() {
        let lock = Arc::new(ReentrantMutex::new(Cell::new(0u64)));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let lock = lock.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let guard = lock.lock();
                    // Non-atomic increment; only correct under mutual exclusion.
                    guard.set(guard.get() + 1);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(lock.lock().get(), 4000);
    }
}

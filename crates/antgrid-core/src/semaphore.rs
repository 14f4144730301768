//! Counting semaphore built from a mutex and a condition variable.
//!
//! The permit count may go negative: its magnitude is then the number of
//! blocked waiters. `signal` hands out an explicit wakeup token so that a
//! spurious condvar wakeup can never steal a permit meant for another thread.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Permits {
    value: isize,
    wakeups: usize,
}

#[derive(Debug)]
pub struct Semaphore {
    permits: Mutex<Permits>,
    cond: Condvar,
}

impl Semaphore {
    pub fn new(value: usize) -> Self {
        Self {
            permits: Mutex::new(Permits {
                value: value as isize,
                wakeups: 0,
            }),
            cond: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, Permits> {
        self.permits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take a permit, blocking until one is signalled if none is available.
    pub fn wait(&self) {
        let mut permits = self.state();
        permits.value -= 1;
        if permits.value < 0 {
            loop {
                permits = self
                    .cond
                    .wait(permits)
                    .unwrap_or_else(PoisonError::into_inner);
                if permits.wakeups > 0 {
                    break;
                }
            }
            permits.wakeups -= 1;
        }
    }

    /// Take a permit only if one is free right now.
    pub fn try_wait(&self) -> bool {
        let mut permits = self.state();
        if permits.value > 0 {
            permits.value -= 1;
            true
        } else {
            false
        }
    }

    /// Return a permit, waking exactly one blocked waiter if there is one.
    pub fn signal(&self) {
        let mut permits = self.state();
        permits.value += 1;
        if permits.value <= 0 {
            permits.wakeups += 1;
            self.cond.notify_one();
        }
    }

    /// Current permit count; negative values count blocked waiters.
    pub fn value(&self) -> isize {
        self.state().value
    }
}

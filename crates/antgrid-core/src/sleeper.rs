//! Sleeper gate: agent `id` must be asleep whenever `threshold > id`.
//!
//! Every change broadcasts, since waiting agents have different ids and only
//! some of them may have become eligible to run.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Default)]
struct GateState {
    threshold: usize,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct SleeperGate {
    state: Mutex<GateState>,
    cond: Condvar,
}

impl SleeperGate {
    pub fn new(threshold: usize) -> Self {
        Self {
            state: Mutex::new(GateState {
                threshold,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn threshold(&self) -> usize {
        self.lock().threshold
    }

    /// Negative requests are ignored, as are all requests after
    /// [`release_all`](Self::release_all).
    pub fn set_threshold(&self, threshold: i64) {
        if threshold < 0 {
            return;
        }
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.threshold = threshold as usize;
        debug!(threshold, "sleeper threshold changed");
        self.cond.notify_all();
    }

    /// Shift the threshold by `delta`, ignoring a result below zero.
    pub fn adjust(&self, delta: i64) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        let next = state.threshold as i64 + delta;
        if next < 0 {
            return;
        }
        state.threshold = next as usize;
        debug!(threshold = next, "sleeper threshold changed");
        self.cond.notify_all();
    }

    pub fn should_sleep(&self, id: usize) -> bool {
        let state = self.lock();
        !state.closed && state.threshold > id
    }

    /// Block while agent `id` must sleep. Returns whether it blocked.
    pub fn wait_if_needed(&self, id: usize) -> bool {
        let mut state = self.lock();
        let mut slept = false;
        while !state.closed && state.threshold > id {
            slept = true;
            state = self.cond.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        slept
    }

    /// Open the gate for good and wake every sleeper. Used at shutdown.
    pub fn release_all(&self) {
        let mut state = self.lock();
        state.threshold = 0;
        state.closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

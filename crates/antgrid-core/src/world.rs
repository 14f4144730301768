//! State shared by every agent thread and the observer.

use crate::cell_lock::CellLockManager;
use crate::config::PacingConfig;
use crate::grid::Grid;
use crate::sleeper::SleeperGate;
use crate::types::Command;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

pub struct World {
    pub locks: CellLockManager,
    pub gate: SleeperGate,
    pub pacing: StepPacing,
    pub census: Census,
    running: AtomicBool,
}

impl World {
    pub fn new(grid: Grid, agents: usize, sleepers: usize, pacing: &PacingConfig) -> Self {
        Self {
            locks: CellLockManager::new(grid),
            gate: SleeperGate::new(sleepers),
            pacing: StepPacing::new(pacing),
            census: Census::new(agents),
            running: AtomicBool::new(true),
        }
    }

    pub fn size(&self) -> usize {
        self.locks.size()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag and force every sleeper awake so it can see it.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.gate.release_all();
    }

    /// Apply an observer command. Returns `false` when the observer should quit.
    pub fn apply(&self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::SlowDown => self.pacing.slow_down(),
            Command::SpeedUp => self.pacing.speed_up(),
            Command::MoreSleepers => self.gate.adjust(1),
            Command::FewerSleepers => self.gate.adjust(-1),
        }
        info!(
            ?command,
            delay_ms = self.pacing.delay_ms(),
            sleepers = self.gate.threshold(),
            "observer command"
        );
        true
    }
}

/// The global per-step delay agents pay after every turn.
#[derive(Debug)]
pub struct StepPacing {
    delay_ms: AtomicU64,
    jitter_ms: u64,
    increment_ms: u64,
}

impl StepPacing {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            delay_ms: AtomicU64::new(config.step_delay_ms),
            jitter_ms: config.step_jitter_ms,
            increment_ms: config.delay_increment_ms,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms.load(Ordering::Relaxed)
    }

    /// Negative requests are ignored.
    pub fn set_delay_ms(&self, delay: i64) {
        if delay >= 0 {
            self.delay_ms.store(delay as u64, Ordering::Relaxed);
        }
    }

    pub fn slow_down(&self) {
        self.set_delay_ms(self.delay_ms() as i64 + self.increment_ms as i64);
    }

    pub fn speed_up(&self) {
        self.set_delay_ms(self.delay_ms() as i64 - self.increment_ms as i64);
    }

    pub fn pause<R: Rng>(&self, rng: &mut R) {
        let jitter = if self.jitter_ms > 0 {
            rng.gen_range(0..self.jitter_ms * 1_000)
        } else {
            0
        };
        let total = Duration::from_millis(self.delay_ms()) + Duration::from_micros(jitter);
        if total.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(total);
        }
    }
}

#[derive(Debug, Default)]
struct AgentSlot {
    placed: AtomicBool,
    asleep: AtomicBool,
    steps: AtomicU64,
}

/// Read-only mirror of agent activity, published by the agent threads for
/// statistics. Agents never read it back.
#[derive(Debug)]
pub struct Census {
    slots: Vec<AgentSlot>,
    live: AtomicUsize,
}

impl Census {
    fn new(agents: usize) -> Self {
        Self {
            slots: (0..agents).map(|_| AgentSlot::default()).collect(),
            live: AtomicUsize::new(0),
        }
    }

    pub fn agents(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn thread_started(&self) -> LiveThread<'_> {
        self.live.fetch_add(1, Ordering::SeqCst);
        LiveThread { census: self }
    }

    pub(crate) fn mark_placed(&self, id: usize) {
        if let Some(slot) = self.slots.get(id) {
            slot.placed.store(true, Ordering::SeqCst);
        }
    }

    pub(crate) fn mark_asleep(&self, id: usize, asleep: bool) {
        if let Some(slot) = self.slots.get(id) {
            slot.asleep.store(asleep, Ordering::SeqCst);
        }
    }

    pub(crate) fn record_step(&self, id: usize) {
        if let Some(slot) = self.slots.get(id) {
            slot.steps.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Agent threads that have started and not yet exited.
    pub fn live_threads(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn placed(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.placed.load(Ordering::SeqCst))
            .count()
    }

    pub fn is_asleep(&self, id: usize) -> bool {
        self.slots
            .get(id)
            .is_some_and(|s| s.asleep.load(Ordering::SeqCst))
    }

    pub fn asleep_ids(&self) -> Vec<usize> {
        (0..self.slots.len()).filter(|id| self.is_asleep(*id)).collect()
    }

    pub fn steps(&self, id: usize) -> u64 {
        self.slots
            .get(id)
            .map_or(0, |s| s.steps.load(Ordering::Relaxed))
    }

    pub fn total_steps(&self) -> u64 {
        self.slots
            .iter()
            .map(|s| s.steps.load(Ordering::Relaxed))
            .sum()
    }
}

pub(crate) struct LiveThread<'a> {
    census: &'a Census,
}

impl Drop for LiveThread<'_> {
    fn drop(&mut self) {
        self.census.live.fetch_sub(1, Ordering::SeqCst);
    }
}

//! Ant agents: one OS thread each, foraging on the shared board.
//!
//! An ant cycles Foraging → Carrying → Returning → Foraging:
//!
//! - Foraging ants walk onto neighbouring food and pick it up.
//! - Carrying ants look for food next to them; when they find some they drop
//!   their own load at their current position and step onto a free cell,
//!   which piles food up over time.
//! - Returning ants take one more step before foraging again.
//!
//! Every candidate neighbour is locked before its symbol is read. The second
//! lock a carrying ant needs is only ever *tried*, so two ants reaching for
//! each other's cells cannot deadlock.

use crate::cell_lock::{CellGuard, CellLockManager};
use crate::types::{Cell, Coord};
use crate::world::World;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Foraging,
    Carrying,
    /// Just dropped food; shown like a foraging ant.
    Returning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentState {
    pub phase: Phase,
    pub awake: bool,
}

impl AgentState {
    pub const fn awake(phase: Phase) -> Self {
        Self { phase, awake: true }
    }

    pub fn symbol(&self) -> Cell {
        match (self.phase, self.awake) {
            (Phase::Foraging | Phase::Returning, true) => Cell::Ant,
            (Phase::Carrying, true) => Cell::FoodAnt,
            (Phase::Foraging | Phase::Returning, false) => Cell::SleepAnt,
            (Phase::Carrying, false) => Cell::SleepFoodAnt,
        }
    }

    pub fn asleep(self) -> Self {
        assert!(self.awake, "ant is already asleep: {self:?}");
        Self { awake: false, ..self }
    }

    pub fn woken(self) -> Self {
        assert!(!self.awake, "ant is already awake: {self:?}");
        Self { awake: true, ..self }
    }
}

/// What one step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Walked onto an empty cell.
    Moved { from: Coord, to: Coord },
    /// Walked onto food and picked it up.
    PickedUp { from: Coord, to: Coord },
    /// Left food at `from` and walked to `to`.
    Dropped { from: Coord, to: Coord },
    /// No suitable neighbour, or the second lock was taken.
    Idle,
}

pub struct Agent {
    id: usize,
    pos: Coord,
    state: AgentState,
    rng: StdRng,
}

impl Agent {
    /// An ant already standing at `pos`. The caller is responsible for the
    /// board showing `state.symbol()` there.
    pub fn new(id: usize, pos: Coord, state: AgentState, rng: StdRng) -> Self {
        Self {
            id,
            pos,
            state,
            rng,
        }
    }

    /// Claim a random empty cell and stand on it as a foraging ant.
    pub fn place(id: usize, world: &World, mut rng: StdRng) -> Self {
        let size = world.size();
        let state = AgentState::awake(Phase::Foraging);
        loop {
            let coord = Coord::new(rng.gen_range(0..size), rng.gen_range(0..size));
            world.locks.pass_turnstile();
            let mut cell = world.locks.lock_cell(coord);
            if cell.get() == Cell::Empty {
                cell.set(state.symbol());
                debug!(id, %coord, "ant placed");
                world.census.mark_placed(id);
                return Self::new(id, coord, state, rng);
            }
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn pos(&self) -> Coord {
        self.pos
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    /// Step until the world stops.
    pub fn run(mut self, world: &World) {
        while world.is_running() {
            self.sleep_if_needed(world);
            if !world.is_running() {
                break;
            }
            let outcome = self.step(&world.locks);
            if outcome != StepOutcome::Idle {
                debug!(id = self.id, ?outcome, phase = ?self.state.phase, "ant step");
            }
            world.census.record_step(self.id);
            world.pacing.pause(&mut self.rng);
        }
        debug!(id = self.id, "ant stopped");
    }

    /// Park on the sleeper gate while our id is below the threshold, showing
    /// the sleeping symbol meanwhile. No cell lock is held while parked.
    pub fn sleep_if_needed(&mut self, world: &World) {
        if !world.gate.should_sleep(self.id) {
            return;
        }
        self.state = self.state.asleep();
        self.show(&world.locks);
        world.census.mark_asleep(self.id, true);

        world.gate.wait_if_needed(self.id);

        self.state = self.state.woken();
        self.show(&world.locks);
        world.census.mark_asleep(self.id, false);
    }

    fn show(&self, locks: &CellLockManager) {
        locks.pass_turnstile();
        let mut cell = locks.lock_cell(self.pos);
        cell.set(self.state.symbol());
    }

    /// One turn of the state machine.
    pub fn step(&mut self, locks: &CellLockManager) -> StepOutcome {
        assert!(self.state.awake, "ant {} stepped while asleep", self.id);

        let mut candidates = self.pos.neighbours(locks.size());
        candidates.shuffle(&mut self.rng);
        locks.pass_turnstile();

        match self.state.phase {
            Phase::Foraging => {
                if let Some(food) = find_and_lock(locks, &mut candidates, Cell::Food) {
                    self.state.phase = Phase::Carrying;
                    let from = self.move_to(locks, food, Cell::Empty);
                    StepOutcome::PickedUp { from, to: self.pos }
                } else if let Some(empty) = find_and_lock(locks, &mut candidates, Cell::Empty) {
                    let from = self.move_to(locks, empty, Cell::Empty);
                    StepOutcome::Moved { from, to: self.pos }
                } else {
                    StepOutcome::Idle
                }
            }
            Phase::Carrying => {
                if let Some(food) = find_and_lock(locks, &mut candidates, Cell::Food) {
                    // Second resource: try only, never wait while holding `food`.
                    let outcome = match find_and_try_lock(locks, &mut candidates, Cell::Empty) {
                        Some(empty) => {
                            self.state.phase = Phase::Returning;
                            let from = self.move_to(locks, empty, Cell::Food);
                            StepOutcome::Dropped { from, to: self.pos }
                        }
                        None => StepOutcome::Idle,
                    };
                    drop(food);
                    outcome
                } else if let Some(empty) = find_and_lock(locks, &mut candidates, Cell::Empty) {
                    let from = self.move_to(locks, empty, Cell::Empty);
                    StepOutcome::Moved { from, to: self.pos }
                } else {
                    StepOutcome::Idle
                }
            }
            Phase::Returning => {
                if let Some(empty) = find_and_lock(locks, &mut candidates, Cell::Empty) {
                    self.state.phase = Phase::Foraging;
                    let from = self.move_to(locks, empty, Cell::Empty);
                    StepOutcome::Moved { from, to: self.pos }
                } else {
                    StepOutcome::Idle
                }
            }
        }
    }

    /// Leave `left_behind` at the current cell and occupy `dest`, whose lock
    /// is held by the caller. Returns the cell we came from.
    ///
    /// Our own cell only ever gets locked transiently by scanning neighbours,
    /// none of which wait on anything while holding it, so the blocking lock
    /// here cannot close a cycle.
    fn move_to(
        &mut self,
        locks: &CellLockManager,
        mut dest: CellGuard<'_>,
        left_behind: Cell,
    ) -> Coord {
        let from = self.pos;
        {
            let mut here = locks.lock_cell(from);
            here.set(left_behind);
        }
        dest.set(self.state.symbol());
        self.pos = dest.coord();
        from
    }
}

/// Lock candidates one by one until one holds `wanted`. The match is removed
/// from `candidates` and returned still locked; every other lock is released.
fn find_and_lock<'a>(
    locks: &'a CellLockManager,
    candidates: &mut Vec<Coord>,
    wanted: Cell,
) -> Option<CellGuard<'a>> {
    for idx in 0..candidates.len() {
        let cell = locks.lock_cell(candidates[idx]);
        if cell.get() == wanted {
            candidates.remove(idx);
            return Some(cell);
        }
    }
    None
}

/// Like [`find_and_lock`] but skips any cell somebody else holds.
fn find_and_try_lock<'a>(
    locks: &'a CellLockManager,
    candidates: &mut Vec<Coord>,
    wanted: Cell,
) -> Option<CellGuard<'a>> {
    for idx in 0..candidates.len() {
        let Some(cell) = locks.try_lock_cell(candidates[idx]) else {
            continue;
        };
        if cell.get() == wanted {
            candidates.remove(idx);
            return Some(cell);
        }
    }
    None
}

//! Per-frame statistics.

use crate::grid::GridSnapshot;
use crate::world::World;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Every ant glyph on the board, asleep or not.
    pub ants: usize,
    pub sleeping: usize,
    /// Agents the simulation was started with.
    pub agents: usize,
    /// Food lying on the board plus food held by carrying ants.
    pub food: usize,
    pub carrying: usize,
    pub threshold: usize,
    /// Ants that should be asleep right now: `min(threshold, agents)`.
    pub expected_sleepers: usize,
    pub delay_ms: u64,
    pub live_threads: usize,
    pub total_actions: u64,
}

impl FrameStats {
    pub fn collect(snapshot: &GridSnapshot, world: &World) -> Self {
        let agents = world.census.agents();
        let threshold = world.gate.threshold();
        Self {
            ants: snapshot.count_where(|c| c.is_ant()),
            sleeping: snapshot.count_where(|c| c.is_sleeping_ant()),
            agents,
            food: snapshot.food_total(),
            carrying: snapshot.count_where(|c| c.carries_food()),
            threshold,
            expected_sleepers: threshold.min(agents),
            delay_ms: world.pacing.delay_ms(),
            live_threads: world.census.live_threads(),
            total_actions: world.locks.grid().total_actions(),
        }
    }

    pub fn food_on_board(&self) -> usize {
        self.food - self.carrying
    }
}

/// Actions per millisecond between two frames.
pub fn action_rate(previous: u64, current: u64, elapsed_ms: u128) -> f64 {
    if elapsed_ms == 0 {
        return 0.0;
    }
    current.saturating_sub(previous) as f64 / elapsed_ms as f64
}

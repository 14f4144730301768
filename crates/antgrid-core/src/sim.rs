//! Simulation lifecycle: seed the board, spawn one thread per ant, stop and
//! join them again.

use crate::agent::Agent;
use crate::config::SimConfig;
use crate::error::{Error, Result};
use crate::grid::{Grid, GridSnapshot};
use crate::types::MAX_GRID_SIZE;
use crate::world::World;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Start parameters taken from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub n_ants: usize,
    pub n_food: usize,
    pub run_for: Duration,
}

impl Params {
    pub fn new(n_ants: usize, n_food: usize, run_for: Duration) -> Self {
        Self {
            n_ants,
            n_food,
            run_for,
        }
    }

    /// Everything must fit on a `size` x `size` board at once.
    pub fn validate(&self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(Error::invalid_params("board size must be positive"));
        }
        if size > MAX_GRID_SIZE {
            return Err(Error::invalid_params(format!(
                "board size {size} exceeds the maximum of {MAX_GRID_SIZE}"
            )));
        }
        let capacity = size
            .checked_mul(size)
            .ok_or_else(|| Error::invalid_params("board too large"))?;
        let wanted = self
            .n_ants
            .checked_add(self.n_food)
            .ok_or_else(|| Error::invalid_params("ant and food counts overflow"))?;
        if wanted > capacity {
            return Err(Error::invalid_params(format!(
                "{} ants and {} food do not fit on a {size}x{size} board ({capacity} cells)",
                self.n_ants, self.n_food
            )));
        }
        Ok(())
    }
}

fn rng_for(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
        None => StdRng::from_entropy(),
    }
}

pub struct Simulation {
    world: Arc<World>,
    handles: Vec<(usize, JoinHandle<()>)>,
    initial_food: usize,
    started: Instant,
}

impl Simulation {
    /// Seed the board and spawn every agent.
    pub fn start(params: Params, config: &SimConfig) -> Result<Self> {
        let size = config.grid.size;
        params.validate(size)?;

        // Setup stream sits past every agent id.
        let mut setup_rng = rng_for(config.seed, params.n_ants as u64);
        let mut grid = Grid::new(size).with_pacing(config.grid.write_pacing());
        grid.seed_food(params.n_food, &mut setup_rng)?;
        info!(size, food = params.n_food, "board seeded");

        let world = World::new(grid, params.n_ants, config.initial_sleepers, &config.pacing);
        Self::spawn(Arc::new(world), params.n_ants, params.n_food, config.seed)
    }

    /// Run agents over an already prepared world. `initial_food` is what
    /// the board holds, used for reporting only.
    pub fn spawn(
        world: Arc<World>,
        n_ants: usize,
        initial_food: usize,
        seed: Option<u64>,
    ) -> Result<Self> {
        let mut sim = Self {
            world,
            handles: Vec::with_capacity(n_ants),
            initial_food,
            started: Instant::now(),
        };

        for id in 0..n_ants {
            let world = sim.world.clone();
            let spawned = thread::Builder::new()
                .name(format!("ant-{id}"))
                .spawn(move || {
                    let _live = world.census.thread_started();
                    let rng = rng_for(seed, id as u64);
                    let agent = Agent::place(id, &world, rng);
                    agent.run(&world);
                });
            match spawned {
                Ok(handle) => sim.handles.push((id, handle)),
                Err(source) => {
                    error!(id, error = %source, "failed to spawn agent thread");
                    if let Err(e) = sim.shutdown() {
                        error!(error = %e, "shutdown after spawn failure");
                    }
                    return Err(Error::Spawn { id, source });
                }
            }
        }

        info!(
            agents = n_ants,
            sleepers = sim.world.gate.threshold(),
            "simulation started"
        );
        Ok(sim)
    }

    pub fn world(&self) -> &Arc<World> {
        &self.world
    }

    pub fn initial_food(&self) -> usize {
        self.initial_food
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Board copy taken under the observer's lock.
    pub fn snapshot(&self) -> GridSnapshot {
        self.world.locks.lock_grid().snapshot()
    }

    /// Stop every agent and wait for it. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.handles.is_empty() {
            self.world.stop();
            return Ok(());
        }
        info!(agents = self.handles.len(), "stopping simulation");
        self.world.stop();

        let mut first_panic = None;
        for (id, handle) in self.handles.drain(..) {
            if let Err(payload) = handle.join() {
                let message = panic_message(payload.as_ref());
                error!(id, %message, "agent panicked");
                if first_panic.is_none() {
                    first_panic = Some(Error::agent_panicked(id, message));
                }
            }
        }
        info!(
            steps = self.world.census.total_steps(),
            elapsed_ms = self.elapsed().as_millis() as u64,
            "simulation stopped"
        );
        first_panic.map_or(Ok(()), Err)
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(error = %e, "simulation shutdown failed");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

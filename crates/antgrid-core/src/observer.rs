//! The observer: periodically takes the whole board, renders it, and feeds
//! user commands back into the world.

use crate::error::Result;
use crate::grid::GridSnapshot;
use crate::sim::Simulation;
use crate::stats::{action_rate, FrameStats};
use crate::types::Command;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// One rendered frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub number: u64,
    pub snapshot: GridSnapshot,
    pub stats: FrameStats,
    /// Wall time since the previous frame was taken.
    pub since_last: Duration,
    pub actions_per_ms: f64,
}

/// Output and input seam for the observer.
pub trait FrameSink {
    /// Draw a frame. Called while the observer owns the board, so agents are
    /// stalled for as long as this takes.
    fn render(&mut self, frame: &Frame) -> Result<()>;

    /// Non-blocking check for one pending command.
    fn poll_input(&mut self) -> Result<Option<Command>>;
}

impl<D: FrameSink + ?Sized> FrameSink for &mut D {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        (**self).render(frame)
    }

    fn poll_input(&mut self) -> Result<Option<Command>> {
        (**self).poll_input()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverOptions {
    pub run_for: Duration,
    pub frame_delay: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TimeElapsed,
    Quit,
}

#[derive(Debug, Clone)]
pub struct ObserverReport {
    pub frames: u64,
    pub exit: ExitReason,
    pub last_stats: Option<FrameStats>,
}

/// Render frames until `run_for` elapses or the display asks to quit.
/// Agents keep running afterwards; stopping them is up to the caller.
pub fn run_observer<D: FrameSink>(
    sim: &Simulation,
    mut display: D,
    options: ObserverOptions,
) -> Result<ObserverReport> {
    let world = sim.world();
    let started = Instant::now();
    let mut last_frame = started;
    let mut last_actions = 0;
    let mut frames = 0;
    let mut last_stats = None;

    info!(
        run_for_ms = options.run_for.as_millis() as u64,
        frame_delay_ms = options.frame_delay.as_millis() as u64,
        "observer started"
    );

    let exit = loop {
        if started.elapsed() >= options.run_for {
            break ExitReason::TimeElapsed;
        }

        {
            let guard = world.locks.lock_grid();
            let snapshot = guard.snapshot();
            let stats = FrameStats::collect(&snapshot, world);
            let now = Instant::now();
            let since_last = now.duration_since(last_frame);
            let frame = Frame {
                number: frames,
                actions_per_ms: action_rate(
                    last_actions,
                    stats.total_actions,
                    since_last.as_millis(),
                ),
                snapshot,
                stats,
                since_last,
            };
            display.render(&frame)?;
            last_frame = now;
            last_actions = frame.stats.total_actions;
            last_stats = Some(frame.stats);
        }
        frames += 1;

        if let Some(command) = display.poll_input()? {
            debug!(?command, "input");
            if !world.apply(command) {
                break ExitReason::Quit;
            }
        }

        std::thread::sleep(options.frame_delay);
    };

    info!(frames, ?exit, "observer finished");
    Ok(ObserverReport {
        frames,
        exit,
        last_stats,
    })
}

/// Machine-readable account of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub agents: usize,
    pub initial_food: usize,
    pub frames: u64,
    pub exit: ExitReason,
    pub elapsed_ms: u64,
    pub agent_steps: u64,
    pub final_stats: Option<FrameStats>,
}

impl RunSummary {
    pub fn new(sim: &Simulation, report: &ObserverReport) -> Self {
        let census = &sim.world().census;
        Self {
            agents: census.agents(),
            initial_food: sim.initial_food(),
            frames: report.frames,
            exit: report.exit,
            elapsed_ms: sim.elapsed().as_millis() as u64,
            agent_steps: census.total_steps(),
            final_stats: report.last_stats.clone(),
        }
    }
}

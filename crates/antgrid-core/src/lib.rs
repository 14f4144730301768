//! antgrid core: a square board shared by one OS thread per ant and a
//! single observer.
//!
//! Layers, bottom up:
//! - `semaphore`: counting semaphore on Mutex + Condvar
//! - `grid` / `cell_lock`: per-cell locks; agents share the board through a
//!   lightswitch, the observer takes all of it through a turnstile
//! - `sleeper`: threshold gate that parks agents with `id < threshold`
//! - `agent` / `world` / `sim`: the forage/carry/return state machine and
//!   the threads running it
//! - `observer` / `stats`: frame loop over a pluggable `FrameSink`

pub mod agent;
pub mod cell_lock;
pub mod config;
pub mod error;
pub mod grid;
pub mod observer;
pub mod semaphore;
pub mod sim;
pub mod sleeper;
pub mod stats;
pub mod types;
pub mod world;

pub use agent::{Agent, AgentState, Phase, StepOutcome};
pub use cell_lock::{CellGuard, CellLockManager, GridGuard};
pub use config::SimConfig;
pub use error::{Error, Result};
pub use grid::{Grid, GridSnapshot, WritePacing};
pub use observer::{
    run_observer, ExitReason, Frame, FrameSink, ObserverOptions, ObserverReport, RunSummary,
};
pub use semaphore::Semaphore;
pub use sim::{Params, Simulation};
pub use sleeper::SleeperGate;
pub use stats::FrameStats;
pub use types::*;
pub use world::World;

//! Frame sink that logs statistics instead of drawing.

use antgrid_core::observer::FrameSink;
use antgrid_core::{Command, Frame, Result};
use std::time::{Duration, Instant};
use tracing::info;

pub struct HeadlessDisplay {
    every: Duration,
    last_log: Option<Instant>,
    logged: u64,
}

impl HeadlessDisplay {
    pub fn new(every: Duration) -> Self {
        Self {
            every,
            last_log: None,
            logged: 0,
        }
    }

    /// Frames that produced a log line.
    pub fn logged(&self) -> u64 {
        self.logged
    }
}

impl FrameSink for HeadlessDisplay {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        let due = self
            .last_log
            .map_or(true, |last| last.elapsed() >= self.every);
        if !due {
            return Ok(());
        }
        self.last_log = Some(Instant::now());
        self.logged += 1;

        let stats = &frame.stats;
        info!(
            frame = frame.number,
            ants = stats.ants,
            sleeping = stats.sleeping,
            food = stats.food,
            carrying = stats.carrying,
            threads = stats.live_threads,
            expected_sleepers = stats.expected_sleepers,
            delay_ms = stats.delay_ms,
            actions_per_ms = frame.actions_per_ms,
            "board"
        );
        Ok(())
    }

    fn poll_input(&mut self) -> Result<Option<Command>> {
        Ok(None)
    }
}

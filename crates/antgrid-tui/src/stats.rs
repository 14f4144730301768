//! Text for the stats header and help line.

use antgrid_core::Frame;

pub const HELP: &str = "'q' for exit, '+' and '-' for delay, '*' and '/' for sleepers";

pub const TOO_SMALL: &str = "You need a bigger terminal window, you can resize";

pub fn stats_lines(frame: &Frame) -> Vec<String> {
    let stats = &frame.stats;
    vec![
        format!(
            "Elapsed: {} ms | {:.2} actions/ms",
            frame.since_last.as_millis(),
            frame.actions_per_ms
        ),
        format!("# Ants (sleep/total): {}/{}", stats.sleeping, stats.ants),
        format!("# Foods: {}", stats.food),
        format!("# Threads: {}", stats.live_threads),
        format!("Expected sleepers: {}", stats.expected_sleepers),
        format!("Delay: {} ms", stats.delay_ms),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use antgrid_core::{CellLockManager, FrameStats, Grid};
    use std::time::Duration;

    #[test]
    fn lines_show_counts_and_rates() {
        let snapshot = CellLockManager::new(Grid::from_rows(&["1o", "S$"]).unwrap())
            .lock_grid()
            .snapshot();
        let frame = Frame {
            number: 3,
            snapshot,
            stats: FrameStats {
                ants: 3,
                sleeping: 2,
                food: 2,
                live_threads: 3,
                expected_sleepers: 2,
                delay_ms: 60,
                ..FrameStats::default()
            },
            since_last: Duration::from_millis(52),
            actions_per_ms: 1.5,
        };

        let lines = stats_lines(&frame);
        assert_eq!(lines[0], "Elapsed: 52 ms | 1.50 actions/ms");
        assert_eq!(lines[1], "# Ants (sleep/total): 2/3");
        assert_eq!(lines[2], "# Foods: 2");
        assert_eq!(lines[3], "# Threads: 3");
        assert_eq!(lines[4], "Expected sleepers: 2");
        assert_eq!(lines[5], "Delay: 60 ms");
    }
}

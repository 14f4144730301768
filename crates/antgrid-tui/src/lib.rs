//! antgrid TUI: renders observer frames with ratatui and maps keys to
//! simulation commands.

pub mod stats;
pub mod tui;

pub use tui::{handle_key, run_tui, TerminalDisplay};

//! Terminal observer: board, stats header and key bindings

use crate::stats::{stats_lines, HELP, TOO_SMALL};
use antgrid_core::observer::FrameSink;
use antgrid_core::{
    run_observer, Cell, Command, Frame as BoardFrame, GridSnapshot, ObserverOptions,
    ObserverReport, Simulation,
};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::collections::VecDeque;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Key handling
// ---------------------------------------------------------------------------

pub fn handle_key(key: KeyEvent) -> Option<Command> {
    // Ctrl-C always quits
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('+') => Some(Command::SlowDown),
        KeyCode::Char('-') => Some(Command::SpeedUp),
        KeyCode::Char('*') => Some(Command::MoreSleepers),
        KeyCode::Char('/') => Some(Command::FewerSleepers),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn cell_style(cell: Cell) -> Style {
    match cell {
        Cell::Empty => Style::default().fg(Color::DarkGray),
        Cell::Food => Style::default().fg(Color::Green),
        Cell::Ant => Style::default().fg(Color::Yellow),
        Cell::FoodAnt => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Cell::SleepAnt | Cell::SleepFoodAnt => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::DIM),
    }
}

/// Width and height the bordered board needs.
fn board_extent(size: usize) -> (u16, u16) {
    let width = (size * 2 + 2).min(u16::MAX as usize) as u16;
    let height = (size + 2).min(u16::MAX as usize) as u16;
    (width, height)
}

pub fn draw(frame: &mut Frame, board: &BoardFrame) {
    let area = frame.area();
    let stats = stats_lines(board);
    let stats_height = stats.len() as u16 + 2;
    let (board_width, board_height) = board_extent(board.snapshot.size());

    if area.width < board_width || area.height < stats_height + board_height + 1 {
        draw_too_small(frame, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(stats_height),
            Constraint::Length(board_height),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    draw_stats(frame, &stats, chunks[0]);
    let board_area = Rect {
        width: board_width,
        ..chunks[1]
    };
    draw_board(frame, &board.snapshot, board_area);
    draw_help(frame, chunks[2]);
}

fn draw_too_small(frame: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new(TOO_SMALL)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_stats(frame: &mut Frame, lines: &[String], area: Rect) {
    let lines: Vec<Line> = lines
        .iter()
        .map(|l| Line::from(Span::raw(l.as_str())))
        .collect();
    let block = Block::default().borders(Borders::ALL).title(" antgrid ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_board(frame: &mut Frame, snapshot: &GridSnapshot, area: Rect) {
    let lines: Vec<Line> = snapshot
        .rows()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| Span::styled(format!("{} ", cell.glyph()), cell_style(*cell)))
                .collect();
            Line::from(spans)
        })
        .collect();
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Span::styled(HELP, Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(Line::from(help)), area);
}

// ---------------------------------------------------------------------------
// Terminal sink
// ---------------------------------------------------------------------------

/// Observer display drawing into a ratatui terminal. Keys come from
/// crossterm unless a script was supplied.
pub struct TerminalDisplay<B: Backend> {
    terminal: Terminal<B>,
    scripted_keys: Option<VecDeque<KeyEvent>>,
}

impl<B: Backend> TerminalDisplay<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            scripted_keys: None,
        }
    }

    /// Replay `keys` instead of reading the real terminal.
    pub fn with_keys(terminal: Terminal<B>, keys: impl IntoIterator<Item = KeyEvent>) -> Self {
        Self {
            terminal,
            scripted_keys: Some(keys.into_iter().collect()),
        }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> FrameSink for TerminalDisplay<B> {
    fn render(&mut self, board: &BoardFrame) -> antgrid_core::Result<()> {
        self.terminal.draw(|f| draw(f, board))?;
        Ok(())
    }

    fn poll_input(&mut self) -> antgrid_core::Result<Option<Command>> {
        if let Some(keys) = self.scripted_keys.as_mut() {
            while let Some(key) = keys.pop_front() {
                if let Some(command) = handle_key(key) {
                    return Ok(Some(command));
                }
            }
            return Ok(None);
        }

        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(command) = handle_key(key) {
                    return Ok(Some(command));
                }
            }
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

fn restore_terminal() -> io::Result<()> {
    terminal::disable_raw_mode()?;
    io::stdout()
        .execute(LeaveAlternateScreen)?
        .execute(cursor::Show)?;
    Ok(())
}

/// Run `f` with `cleanup` chained in front of the current panic hook, then
/// put the previous hook back.
fn with_panic_cleanup<T>(
    cleanup: impl Fn() + Send + Sync + 'static,
    f: impl FnOnce() -> T,
) -> T {
    let original = Arc::new(std::panic::take_hook());
    let chained = original.clone();
    std::panic::set_hook(Box::new(move |info| {
        cleanup();
        chained(info);
    }));

    let result = f();

    drop(std::panic::take_hook());
    std::panic::set_hook(Box::new(move |info| original(info)));
    result
}

/// Take over the terminal and run the observer until time is up or the
/// user quits. Agents are left running; the caller shuts them down.
pub fn run_tui(sim: &Simulation, options: ObserverOptions) -> anyhow::Result<ObserverReport> {
    with_panic_cleanup(
        || {
            let _ = restore_terminal();
        },
        || run_session(sim, options),
    )
}

fn run_session(sim: &Simulation, options: ObserverOptions) -> anyhow::Result<ObserverReport> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend: CrosstermBackend<Stdout> = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = run_observer(sim, TerminalDisplay::new(terminal), options);

    restore_terminal()?;
    tracing::info!("terminal restored");

    Ok(result?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use antgrid_core::{CellLockManager, FrameStats, Grid};
    use ratatui::backend::TestBackend;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn board_frame(rows: &[&str]) -> BoardFrame {
        let snapshot = CellLockManager::new(Grid::from_rows(rows).unwrap())
            .lock_grid()
            .snapshot();
        BoardFrame {
            number: 0,
            stats: FrameStats {
                ants: snapshot.count_where(|c| c.is_ant()),
                food: snapshot.food_total(),
                ..FrameStats::default()
            },
            snapshot,
            since_last: Duration::from_millis(50),
            actions_per_ms: 0.0,
        }
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    // Keys

    #[test]
    fn quit_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('q'))), Some(Command::Quit));
        assert_eq!(handle_key(key(KeyCode::Esc)), Some(Command::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(ctrl_c), Some(Command::Quit));
    }

    #[test]
    fn delay_and_sleeper_keys() {
        assert_eq!(handle_key(key(KeyCode::Char('+'))), Some(Command::SlowDown));
        assert_eq!(handle_key(key(KeyCode::Char('-'))), Some(Command::SpeedUp));
        assert_eq!(
            handle_key(key(KeyCode::Char('*'))),
            Some(Command::MoreSleepers)
        );
        assert_eq!(
            handle_key(key(KeyCode::Char('/'))),
            Some(Command::FewerSleepers)
        );
    }

    #[test]
    fn other_keys_are_ignored() {
        assert_eq!(handle_key(key(KeyCode::Char('c'))), None);
        assert_eq!(handle_key(key(KeyCode::Enter)), None);
    }

    // Rendering

    #[test]
    fn renders_board_stats_and_help() {
        let terminal = Terminal::new(TestBackend::new(70, 16)).unwrap();
        let mut display = TerminalDisplay::new(terminal);
        display.render(&board_frame(&["1o-", "-P-", "S-$"])).unwrap();

        let text = screen(display.terminal());
        assert!(text.contains("# Ants (sleep/total): 0/4"));
        assert!(text.contains("# Foods: 3"));
        assert!(text.contains("1 o - "));
        assert!(text.contains("- P - "));
        assert!(text.contains("S - $ "));
        assert!(text.contains("'q' for exit"));
        assert!(!text.contains(TOO_SMALL));
    }

    #[test]
    fn small_terminal_asks_for_resize() {
        let terminal = Terminal::new(TestBackend::new(60, 6)).unwrap();
        let mut display = TerminalDisplay::new(terminal);
        display.render(&board_frame(&["---", "---", "---"])).unwrap();

        let text = screen(display.terminal());
        assert!(text.contains("You need a bigger terminal window"));
        assert!(!text.contains("# Foods"));
    }

    #[test]
    fn scripted_keys_skip_unbound_ones() {
        let terminal = Terminal::new(TestBackend::new(10, 5)).unwrap();
        let mut display = TerminalDisplay::with_keys(
            terminal,
            [key(KeyCode::Char('x')), key(KeyCode::Char('*')), key(KeyCode::Char('q'))],
        );
        assert_eq!(display.poll_input().unwrap(), Some(Command::MoreSleepers));
        assert_eq!(display.poll_input().unwrap(), Some(Command::Quit));
        assert_eq!(display.poll_input().unwrap(), None);
    }

    // Panic hook

    #[test]
    fn panic_cleanup_only_runs_inside_the_session() {
        static CLEANUPS: AtomicUsize = AtomicUsize::new(0);

        let caught = with_panic_cleanup(
            || {
                CLEANUPS.fetch_add(1, Ordering::SeqCst);
            },
            || std::panic::catch_unwind(|| panic!("inside")).is_err(),
        );
        assert!(caught);
        assert_eq!(CLEANUPS.load(Ordering::SeqCst), 1);

        let _ = std::panic::catch_unwind(|| panic!("after"));
        assert_eq!(CLEANUPS.load(Ordering::SeqCst), 1);
    }
}

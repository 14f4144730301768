//! Board coordinates and cell symbols

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default board edge length.
pub const GRID_SIZE: usize = 30;

/// Largest board edge a simulation accepts.
pub const MAX_GRID_SIZE: usize = 1_024;

/// A board position. `row` and `col` are both in `0..size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Flat arena index for a board of edge `size`.
    pub fn index(&self, size: usize) -> usize {
        self.row * size + self.col
    }

    /// The in-bounds members of the 8-neighbourhood, in row-major order.
    pub fn neighbours(&self, size: usize) -> Vec<Coord> {
        let mut out = Vec::with_capacity(8);
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                if dr == 0 && dc == 0 {
                    continue;
                }
                let row = self.row as isize + dr;
                let col = self.col as isize + dc;
                if row < 0 || col < 0 || row >= size as isize || col >= size as isize {
                    continue;
                }
                out.push(Coord::new(row as usize, col as usize));
            }
        }
        out
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The symbol held by one board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    #[default]
    Empty,
    Food,
    Ant,
    FoodAnt,
    SleepAnt,
    SleepFoodAnt,
}

impl Cell {
    pub const ALL: [Cell; 6] = [
        Cell::Empty,
        Cell::Food,
        Cell::Ant,
        Cell::FoodAnt,
        Cell::SleepAnt,
        Cell::SleepFoodAnt,
    ];

    pub fn glyph(&self) -> char {
        match self {
            Cell::Empty => '-',
            Cell::Food => 'o',
            Cell::Ant => '1',
            Cell::FoodAnt => 'P',
            Cell::SleepAnt => 'S',
            Cell::SleepFoodAnt => '$',
        }
    }

    pub fn from_glyph(c: char) -> Option<Cell> {
        Cell::ALL.into_iter().find(|cell| cell.glyph() == c)
    }

    pub fn is_ant(&self) -> bool {
        matches!(
            self,
            Cell::Ant | Cell::FoodAnt | Cell::SleepAnt | Cell::SleepFoodAnt
        )
    }

    pub fn is_sleeping_ant(&self) -> bool {
        matches!(self, Cell::SleepAnt | Cell::SleepFoodAnt)
    }

    /// An ant glyph that shows food being carried.
    pub fn carries_food(&self) -> bool {
        matches!(self, Cell::FoodAnt | Cell::SleepFoodAnt)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.glyph())
    }
}

/// Observer-side requests decoded from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Raise the per-step pacing delay.
    SlowDown,
    /// Lower the per-step pacing delay.
    SpeedUp,
    MoreSleepers,
    FewerSleepers,
}

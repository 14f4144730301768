//! The shared board.
//!
//! Each cell symbol sits behind its own mutex in a flat arena indexed by
//! `row * size + col`. Nothing outside this crate can reach a symbol except
//! through a [`CellGuard`](crate::cell_lock::CellGuard) or the observer's
//! [`GridGuard`](crate::cell_lock::GridGuard).

use crate::error::{Error, Result};
use crate::types::{Cell, Coord};
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Artificial cost of a symbol write, reproducing a slow display device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritePacing {
    pub delay: Duration,
    pub jitter: Duration,
}

impl WritePacing {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn pause(&self) {
        if self.delay.is_zero() && self.jitter.is_zero() {
            return;
        }
        let jitter_us = self.jitter.as_micros() as u64;
        let extra = if jitter_us > 0 {
            rand::thread_rng().gen_range(0..jitter_us)
        } else {
            0
        };
        std::thread::sleep(self.delay + Duration::from_micros(extra));
    }
}

pub struct Grid {
    size: usize,
    cells: Vec<Mutex<Cell>>,
    actions: Vec<AtomicU64>,
    pacing: WritePacing,
}

impl Grid {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: (0..size * size).map(|_| Mutex::new(Cell::Empty)).collect(),
            actions: (0..size * size).map(|_| AtomicU64::new(0)).collect(),
            pacing: WritePacing::none(),
        }
    }

    /// Build a board from glyph rows, e.g. `["-o-", "-1-", "---"]`.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(Error::InvalidLayout("no rows".into()));
        }
        let mut grid = Grid::new(size);
        for (row, line) in rows.iter().enumerate() {
            let glyphs: Vec<char> = line.chars().collect();
            if glyphs.len() != size {
                return Err(Error::InvalidLayout(format!(
                    "row {row} has {} cells, expected {size}",
                    glyphs.len()
                )));
            }
            for (col, glyph) in glyphs.into_iter().enumerate() {
                let cell = Cell::from_glyph(glyph).ok_or_else(|| {
                    Error::InvalidLayout(format!("unknown glyph {glyph:?} at ({row}, {col})"))
                })?;
                grid.put(Coord::new(row, col), cell);
            }
        }
        Ok(grid)
    }

    pub fn with_pacing(mut self, pacing: WritePacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unsynchronised write for the single-threaded setup phase.
    pub fn put(&mut self, coord: Coord, cell: Cell) {
        let idx = coord.index(self.size);
        *self.cells[idx]
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner) = cell;
    }

    /// Unsynchronised read for the single-threaded setup phase.
    pub fn peek(&mut self, coord: Coord) -> Cell {
        let idx = coord.index(self.size);
        *self.cells[idx]
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Place `count` food cells on random empty positions.
    pub fn seed_food<R: Rng>(&mut self, count: usize, rng: &mut R) -> Result<()> {
        let empty = self.count_setup(Cell::Empty);
        if count > empty {
            return Err(Error::invalid_params(format!(
                "cannot place {count} food on {empty} empty cells"
            )));
        }
        let mut placed = 0;
        while placed < count {
            let coord = Coord::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size));
            if self.peek(coord) == Cell::Empty {
                self.put(coord, Cell::Food);
                placed += 1;
            }
        }
        Ok(())
    }

    fn count_setup(&mut self, wanted: Cell) -> usize {
        self.cells
            .iter_mut()
            .map(|m| *m.get_mut().unwrap_or_else(PoisonError::into_inner))
            .filter(|c| *c == wanted)
            .count()
    }

    pub(crate) fn slot(&self, coord: Coord) -> &Mutex<Cell> {
        &self.cells[coord.index(self.size)]
    }

    pub(crate) fn touch(&self, coord: Coord) {
        self.actions[coord.index(self.size)].fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn pacing(&self) -> WritePacing {
        self.pacing
    }

    /// Reads plus writes performed on `coord` so far.
    pub fn actions_at(&self, coord: Coord) -> u64 {
        self.actions[coord.index(self.size)].load(Ordering::Relaxed)
    }

    pub fn total_actions(&self) -> u64 {
        self.actions.iter().map(|a| a.load(Ordering::Relaxed)).sum()
    }
}

/// A copy of every cell taken while no agent held a cell lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSnapshot {
    size: usize,
    cells: Vec<Cell>,
}

impl GridSnapshot {
    pub(crate) fn new(size: usize, cells: Vec<Cell>) -> Self {
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, coord: Coord) -> Cell {
        self.cells[coord.index(self.size)]
    }

    pub fn count(&self, wanted: Cell) -> usize {
        self.cells.iter().filter(|c| **c == wanted).count()
    }

    pub fn count_where(&self, pred: impl Fn(Cell) -> bool) -> usize {
        self.cells.iter().filter(|c| pred(**c)).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size.max(1))
    }

    /// Food lying on the board plus food held by carrying ants.
    pub fn food_total(&self) -> usize {
        self.count_where(|c| c == Cell::Food || c.carries_food())
    }
}

impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            for cell in row {
                write!(f, "{}", cell.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

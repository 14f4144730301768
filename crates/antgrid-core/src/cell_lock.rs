//! Per-cell locking with lightswitch arbitration against the observer.
//!
//! Agents lock individual cells and can do so fully concurrently with each
//! other. The first agent lock taken while no other is outstanding also takes
//! the `grid_available` semaphore on behalf of every agent, and the last one
//! released gives it back. The observer therefore sees the board only when no
//! agent holds any cell.
//!
//! The observer queues on the turnstile before waiting for `grid_available`.
//! Agents pass through the same turnstile at the start of every step, so once
//! the observer is waiting, no new step can start and the board drains.

use crate::grid::{Grid, GridSnapshot};
use crate::semaphore::Semaphore;
use crate::types::{Cell, Coord};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

/// "First one in turns on the light, last one out turns it off."
#[derive(Debug, Default)]
struct Lightswitch {
    count: Mutex<usize>,
}

impl Lightswitch {
    fn enter(&self, room: &Semaphore) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count += 1;
        if *count == 1 {
            room.wait();
        }
    }

    fn leave(&self, room: &Semaphore) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count -= 1;
        if *count == 0 {
            room.signal();
        }
    }
}

pub struct CellLockManager {
    grid: Grid,
    lightswitch: Lightswitch,
    grid_available: Semaphore,
    turnstile: Semaphore,
    held: AtomicUsize,
}

impl CellLockManager {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            lightswitch: Lightswitch::default(),
            grid_available: Semaphore::new(1),
            turnstile: Semaphore::new(1),
            held: AtomicUsize::new(0),
        }
    }

    pub fn size(&self) -> usize {
        self.grid.size()
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Block until the cell at `coord` is ours.
    pub fn lock_cell(&self, coord: Coord) -> CellGuard<'_> {
        self.lightswitch.enter(&self.grid_available);
        let slot = self
            .grid
            .slot(coord)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.guard(coord, slot)
    }

    /// Take the cell only if nobody holds it. Joining the lightswitch may
    /// still block while the observer owns the board.
    pub fn try_lock_cell(&self, coord: Coord) -> Option<CellGuard<'_>> {
        self.lightswitch.enter(&self.grid_available);
        let slot = match self.grid.slot(coord).try_lock() {
            Ok(slot) => slot,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                self.lightswitch.leave(&self.grid_available);
                return None;
            }
        };
        Some(self.guard(coord, slot))
    }

    fn guard<'a>(&'a self, coord: Coord, slot: MutexGuard<'a, Cell>) -> CellGuard<'a> {
        self.held.fetch_add(1, Ordering::SeqCst);
        CellGuard {
            manager: self,
            coord,
            slot: Some(slot),
        }
    }

    /// Queue behind a waiting observer, if any. Called by agents before
    /// taking their first cell lock of a step.
    pub fn pass_turnstile(&self) {
        self.turnstile.wait();
        self.turnstile.signal();
    }

    /// Exclusive access to the whole board for the observer.
    pub fn lock_grid(&self) -> GridGuard<'_> {
        self.turnstile.wait();
        self.grid_available.wait();
        GridGuard { manager: self }
    }

    /// Cell guards currently alive. Never blocks.
    pub fn locked_cells(&self) -> usize {
        self.held.load(Ordering::SeqCst)
    }
}

/// Ownership of one cell. The lock is released when the guard drops.
pub struct CellGuard<'a> {
    manager: &'a CellLockManager,
    coord: Coord,
    slot: Option<MutexGuard<'a, Cell>>,
}

impl CellGuard<'_> {
    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn get(&self) -> Cell {
        self.manager.grid.touch(self.coord);
        match &self.slot {
            Some(slot) => **slot,
            None => unreachable!("cell guard used after release"),
        }
    }

    pub fn set(&mut self, cell: Cell) {
        self.manager.grid.touch(self.coord);
        self.manager.grid.pacing().pause();
        if let Some(slot) = self.slot.as_mut() {
            **slot = cell;
        }
    }

    pub fn unlock(self) {}
}

impl Drop for CellGuard<'_> {
    fn drop(&mut self) {
        // Cell first, then the lightswitch.
        self.manager.held.fetch_sub(1, Ordering::SeqCst);
        drop(self.slot.take());
        self.manager.lightswitch.leave(&self.manager.grid_available);
    }
}

/// The observer's hold on the whole board.
pub struct GridGuard<'a> {
    manager: &'a CellLockManager,
}

impl GridGuard<'_> {
    pub fn read(&self, coord: Coord) -> Cell {
        let grid = &self.manager.grid;
        *grid.slot(coord).lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let size = self.manager.size();
        let cells = (0..size)
            .flat_map(|row| (0..size).map(move |col| Coord::new(row, col)))
            .map(|coord| self.read(coord))
            .collect();
        GridSnapshot::new(size, cells)
    }

    pub fn locked_cells(&self) -> usize {
        self.manager.locked_cells()
    }
}

impl Drop for GridGuard<'_> {
    fn drop(&mut self) {
        self.manager.turnstile.signal();
        self.manager.grid_available.signal();
    }
}

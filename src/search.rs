use std::fmt::{self, Debug};
use bit_set::BitSet;
use crate::board::Board;
use crate::core::{CellState, DeadEnd, RegionId, Unit};

/// A placement frame: which cell was occupied and where the elimination
/// trail stood before its propagation ran. Undo pops the trail back to the
/// watermark, so backtracking is an exact replay of elimination reversal
/// with no grid snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    placed: u32,
    trail_mark: u32,
}

/// The engine's working memory over one board: a flat grid of cell states
/// plus per-row/column/region bookkeeping kept incrementally in sync with
/// it. Owned exclusively by one solver invocation; created fresh per solve.
#[derive(Clone)]
pub struct SearchState {
    size: usize,
    cells: Box<[CellState]>,
    row_open: Box<[usize]>,
    col_open: Box<[usize]>,
    row_occupied: Box<[bool]>,
    col_occupied: Box<[bool]>,
    region_occupied: Box<[bool]>,
    // Open cells per region, ascending, so candidate order is row-major.
    region_open: Box<[BitSet]>,
    trail: Vec<u32>,
    frames: Vec<Frame>,
    occupied_count: usize,
}

impl SearchState {
    pub fn new(board: &Board) -> Self {
        let size = board.size();
        let mut region_open = Vec::with_capacity(size);
        for g in 0..size {
            let mut open = BitSet::with_capacity(board.n_cells());
            for &cell in board.region_cells(g) {
                open.insert(cell);
            }
            region_open.push(open);
        }
        SearchState {
            size,
            cells: vec![CellState::Open; board.n_cells()].into_boxed_slice(),
            row_open: vec![size; size].into_boxed_slice(),
            col_open: vec![size; size].into_boxed_slice(),
            row_occupied: vec![false; size].into_boxed_slice(),
            col_occupied: vec![false; size].into_boxed_slice(),
            region_occupied: vec![false; size].into_boxed_slice(),
            region_open: region_open.into_boxed_slice(),
            trail: Vec::new(),
            frames: Vec::new(),
            occupied_count: 0,
        }
    }

    pub fn cell(&self, cell: usize) -> CellState {
        self.cells[cell]
    }

    /// Number of placements currently on the board.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Every region holds a marker, which by the propagation invariants
    /// means every row and column does too.
    pub fn is_complete(&self) -> bool {
        self.occupied_count == self.size
    }

    pub fn row_open_count(&self, row: usize) -> usize {
        self.row_open[row]
    }

    pub fn col_open_count(&self, col: usize) -> usize {
        self.col_open[col]
    }

    pub fn region_open_count(&self, region: RegionId) -> usize {
        self.region_open[region].len()
    }

    pub fn region_occupied(&self, region: RegionId) -> bool {
        self.region_occupied[region]
    }

    /// Open cells of a region, ascending (row-major).
    pub fn region_open_cells(&self, region: RegionId) -> impl Iterator<Item = usize> + '_ {
        self.region_open[region].iter()
    }

    /// Flip one cell `Open -> Eliminated` and record it on the trail.
    /// Cells that are already `Eliminated` or `Occupied` are left alone.
    fn eliminate(&mut self, board: &Board, cell: usize) {
        if self.cells[cell] != CellState::Open {
            return;
        }
        self.cells[cell] = CellState::Eliminated;
        self.trail.push(cell as u32);
        let [r, c] = board.pos(cell);
        self.row_open[r] -= 1;
        self.col_open[c] -= 1;
        self.region_open[board.region_of_cell(cell)].remove(cell);
    }

    /// Occupy an `Open` cell and propagate eliminations: the rest of its
    /// row, column, and region, and its diagonal neighbors. Returns the
    /// first dead end the placement creates, if any (rows scanned first,
    /// then columns, then regions, lowest index first, so traces are
    /// deterministic). On a dead end the placement stays applied; the
    /// caller unwinds it via `unplace`.
    pub fn place(&mut self, board: &Board, cell: usize) -> Option<DeadEnd> {
        debug_assert_eq!(self.cells[cell], CellState::Open, "placing a non-open cell");
        self.frames.push(Frame { placed: cell as u32, trail_mark: self.trail.len() as u32 });
        let [r, c] = board.pos(cell);
        let g = board.region_of_cell(cell);
        self.cells[cell] = CellState::Occupied;
        self.row_open[r] -= 1;
        self.col_open[c] -= 1;
        self.region_open[g].remove(cell);
        self.row_occupied[r] = true;
        self.col_occupied[c] = true;
        self.region_occupied[g] = true;
        self.occupied_count += 1;
        for i in 0..self.size {
            self.eliminate(board, r * self.size + i);
            self.eliminate(board, i * self.size + c);
        }
        for &mate in board.region_cells(g) {
            self.eliminate(board, mate);
        }
        for diag in board.diagonal_neighbors(cell) {
            self.eliminate(board, diag);
        }
        self.find_dead_end()
    }

    fn find_dead_end(&self) -> Option<DeadEnd> {
        for i in 0..self.size {
            if !self.row_occupied[i] && self.row_open[i] == 0 {
                return Some(DeadEnd::new(Unit::Row, i));
            }
        }
        for i in 0..self.size {
            if !self.col_occupied[i] && self.col_open[i] == 0 {
                return Some(DeadEnd::new(Unit::Col, i));
            }
        }
        for i in 0..self.size {
            if !self.region_occupied[i] && self.region_open[i].is_empty() {
                return Some(DeadEnd::new(Unit::Region, i));
            }
        }
        None
    }

    /// Exact inverse of the most recent `place`: restore every cell its
    /// propagation flipped, then reopen the placed cell itself. Returns the
    /// placed cell, or None if nothing is placed.
    pub fn unplace(&mut self, board: &Board) -> Option<usize> {
        let frame = self.frames.pop()?;
        while self.trail.len() > frame.trail_mark as usize {
            if let Some(flipped) = self.trail.pop() {
                let cell = flipped as usize;
                self.cells[cell] = CellState::Open;
                let [r, c] = board.pos(cell);
                self.row_open[r] += 1;
                self.col_open[c] += 1;
                self.region_open[board.region_of_cell(cell)].insert(cell);
            }
        }
        let placed = frame.placed as usize;
        let [r, c] = board.pos(placed);
        let g = board.region_of_cell(placed);
        self.cells[placed] = CellState::Open;
        self.row_open[r] += 1;
        self.col_open[c] += 1;
        self.region_open[g].insert(placed);
        self.row_occupied[r] = false;
        self.col_occupied[c] = false;
        self.region_occupied[g] = false;
        self.occupied_count -= 1;
        Some(placed)
    }

    /// Stable snapshot of the grid as the `CellState` u8 codec.
    pub fn snapshot(&self) -> Vec<u8> {
        self.cells.iter().map(|&s| s.into()).collect()
    }
}

impl Debug for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.size {
            for c in 0..self.size {
                let ch = match self.cells[r * self.size + c] {
                    CellState::Open => '.',
                    CellState::Eliminated => 'x',
                    CellState::Occupied => 'Q',
                };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use super::*;

    /// Recompute every count and flag from the grid and check the
    /// incremental bookkeeping against it.
    pub fn assert_consistent(state: &SearchState, board: &Board) {
        let size = board.size();
        for r in 0..size {
            let open = (0..size)
                .filter(|&c| state.cell(r * size + c) == CellState::Open)
                .count();
            assert_eq!(state.row_open_count(r), open, "row {} open count", r);
            let occ = (0..size)
                .filter(|&c| state.cell(r * size + c) == CellState::Occupied)
                .count();
            assert_eq!(state.row_occupied[r], occ > 0, "row {} occupied flag", r);
            assert!(occ <= 1, "row {} has {} markers", r, occ);
        }
        for c in 0..size {
            let open = (0..size)
                .filter(|&r| state.cell(r * size + c) == CellState::Open)
                .count();
            assert_eq!(state.col_open_count(c), open, "col {} open count", c);
        }
        for g in 0..size {
            let open: Vec<usize> = board
                .region_cells(g)
                .iter()
                .copied()
                .filter(|&cell| state.cell(cell) == CellState::Open)
                .collect();
            assert_eq!(
                state.region_open_cells(g).collect::<Vec<_>>(),
                open,
                "region {} open set",
                g,
            );
        }
    }
}

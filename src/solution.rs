use std::fmt::{self, Display};
use serde_derive::Serialize;
use crate::board::Board;
use crate::core::{CellState, Error, Index};
use crate::search::SearchState;

const EXTRACTION_INCONSISTENT: Error =
    Error::new_const("Internal inconsistency: a row does not hold exactly one marker");

/// A validated placement: one `(row, col)` per row, sorted by row ascending.
/// Derived read-only from a completed search; the row index doubles as a
/// stable ordering key since exactly one marker exists per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
    positions: Vec<Index>,
}

impl Solution {
    /// Scan a solved search state row by row and record the single occupied
    /// column per row. Any other occupancy count is a propagation defect,
    /// not a caller error: it asserts loudly in testing builds and surfaces
    /// as an internal error in release builds.
    pub(crate) fn extract(board: &Board, search: &SearchState) -> Result<Self, Error> {
        let size = board.size();
        let mut positions = Vec::with_capacity(size);
        for r in 0..size {
            let occupied: Vec<usize> = (0..size)
                .filter(|&c| search.cell(board.cell([r, c])) == CellState::Occupied)
                .collect();
            if occupied.len() != 1 {
                debug_assert!(
                    false,
                    "row {} holds {} markers after a reported success",
                    r,
                    occupied.len(),
                );
                return Err(EXTRACTION_INCONSISTENT);
            }
            positions.push([r, occupied[0]]);
        }
        Ok(Solution { positions })
    }

    pub fn positions(&self) -> &[Index] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Re-check the full rule set against a board: column uniqueness,
    /// region uniqueness, and no diagonally touching pair. Row uniqueness
    /// holds by construction. Intended for tests and the request boundary's
    /// own sanity checks.
    pub fn verify(&self, board: &Board) -> Result<(), Error> {
        if self.positions.len() != board.size() {
            return Err(Error::new(format!(
                "expected {} positions, got {}",
                board.size(),
                self.positions.len(),
            )));
        }
        for (i, &[r, c]) in self.positions.iter().enumerate() {
            if r != i {
                return Err(Error::new(format!("position {} is in row {}", i, r)));
            }
            for &[r2, c2] in &self.positions[..i] {
                if c2 == c {
                    return Err(Error::new(format!("rows {} and {} share column {}", r2, r, c)));
                }
                if board.region_of([r2, c2]) == board.region_of([r, c]) {
                    return Err(Error::new(format!(
                        "rows {} and {} share region {}",
                        r2, r,
                        board.region_of([r, c]),
                    )));
                }
                if r.abs_diff(r2) == 1 && c.abs_diff(c2) == 1 {
                    return Err(Error::new(format!(
                        "markers at [{}, {}] and [{}, {}] touch diagonally",
                        r2, c2, r, c,
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.positions.len();
        for r in 0..size {
            for c in 0..size {
                let ch = if self.positions[r][1] == c { 'Q' } else { '.' };
                write!(f, "{}", ch)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

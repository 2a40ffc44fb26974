use std::borrow::Cow;
use std::fmt::{self, Display};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::Display as StrumDisplay;

/// Error type. This indicates misuse of the engine API or a bug in the
/// engine itself. Dead ends during search and exhaustion of the search space
/// are not errors, and neither is a malformed puzzle definition (see
/// `board::InvalidBoard` for that).
#[derive(Debug, Clone, PartialEq)]
pub struct Error(Cow<'static, str>);

impl Error {
    pub const fn new_const(s: &'static str) -> Self {
        Error(Cow::Borrowed(s))
    }

    pub fn new<S: Into<String>>(s: S) -> Self {
        Error(Cow::Owned(s.into()))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Error {}

/// Boards are square grids of cells addressed as `[row, col]`.
pub type Index = [usize; 2];

/// Region labels. On the wire they are `u8` (boards are capped at 255);
/// internally they double as indices into per-region tables.
pub type RegionId = usize;

/// Per-cell status during search. `Open` cells may still receive a marker;
/// `Eliminated` cells were ruled out by propagation under the current
/// partial placement; `Occupied` cells hold a marker.
///
/// The `u8` values are stable and shared with the snapshot/wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum CellState {
    Open = 0,
    Eliminated = 1,
    Occupied = 2,
}

/// The three families of exactly-one units on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum Unit {
    Row,
    Col,
    Region,
}

/// A dead end found by propagation: the given unit has no `Open` cell left
/// and no marker either, so the current partial placement cannot extend to
/// a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadEnd {
    pub unit: Unit,
    pub index: usize,
}

impl DeadEnd {
    pub fn new(unit: Unit, index: usize) -> Self {
        DeadEnd { unit, index }
    }
}

impl Display for DeadEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} exhausted", self.unit, self.index)
    }
}

/// A decision point in the search: the region being branched on, the flat
/// cell indices that were `Open` in it when the branch was taken (ascending,
/// i.e. row-major), and a cursor into them. The cell at the cursor is the
/// one currently placed.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchPoint {
    pub branch_step: usize,
    pub region: RegionId,
    cells: Vec<usize>,
    cursor: usize,
}

impl BranchPoint {
    /// Panics if `cells` is empty: the dead-end scan runs before ranking, so
    /// an unsatisfied region with no open cells never reaches a ranker.
    pub fn new(step: usize, region: RegionId, cells: Vec<usize>) -> Self {
        assert!(!cells.is_empty(), "BranchPoint for region {} with no cells", region);
        BranchPoint { branch_step: step, region, cells, cursor: 0 }
    }

    /// The cell currently chosen at this decision point.
    pub fn chosen(&self) -> usize {
        self.cells[self.cursor]
    }

    /// How many untried alternatives remain after the chosen one.
    pub fn remaining(&self) -> usize {
        self.cells.len() - 1 - self.cursor
    }

    /// Total number of candidates this decision branched over.
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Move on to the next untried candidate, if any.
    pub fn advance(&mut self) -> Option<usize> {
        if self.cursor + 1 < self.cells.len() {
            self.cursor += 1;
            Some(self.cells[self.cursor])
        } else {
            None
        }
    }
}

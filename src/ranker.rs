use strum_macros::{Display, EnumIter, EnumString};
use crate::board::Board;
use crate::core::{BranchPoint, RegionId};
use crate::search::SearchState;

/// A ranker picks the next region to branch on. Returning None means every
/// region already holds a marker, i.e. the search is complete. Candidate
/// cells inside the chosen region are always the region's open cells in
/// row-major order; rankers only choose *which* region.
pub trait Ranker {
    fn next_branch(&self, step: usize, board: &Board, search: &SearchState) -> Option<BranchPoint>;
}

fn branch_on(step: usize, region: RegionId, search: &SearchState) -> BranchPoint {
    BranchPoint::new(step, region, search.region_open_cells(region).collect())
}

/// Minimum-remaining-values: branch on the unsatisfied region with the
/// fewest open cells, ties broken by lowest region id. This ordering is
/// part of the designed behavior, not just a speed knob: it is what makes
/// solving deterministic and keeps the branching factor small enough for
/// the board sizes seen in practice.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinRemainingRanker;

impl Ranker for MinRemainingRanker {
    fn next_branch(&self, step: usize, board: &Board, search: &SearchState) -> Option<BranchPoint> {
        let mut best: Option<(RegionId, usize)> = None;
        for region in 0..board.size() {
            if search.region_occupied(region) {
                continue;
            }
            let open = search.region_open_count(region);
            // Strict `<` keeps the lowest id on ties.
            if best.map_or(true, |(_, n)| open < n) {
                best = Some((region, open));
            }
        }
        best.map(|(region, _)| branch_on(step, region, search))
    }
}

/// Branches on the lowest-id unsatisfied region, ignoring how constrained
/// it is. Exists as a baseline: tests and the benchmark pit it against
/// `MinRemainingRanker` to guard the heuristic from being quietly broken.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstUnsatisfiedRanker;

impl Ranker for FirstUnsatisfiedRanker {
    fn next_branch(&self, step: usize, board: &Board, search: &SearchState) -> Option<BranchPoint> {
        (0..board.size())
            .find(|&region| !search.region_occupied(region))
            .map(|region| branch_on(step, region, search))
    }
}

/// Ranker selection for the CLI/benchmark surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum RankerKind {
    MinRemaining,
    FirstUnsatisfied,
}

impl RankerKind {
    pub fn build(&self) -> Box<dyn Ranker> {
        match self {
            RankerKind::MinRemaining => Box::new(MinRemainingRanker),
            RankerKind::FirstUnsatisfied => Box::new(FirstUnsatisfiedRanker),
        }
    }
}

impl<R: Ranker + ?Sized> Ranker for Box<R> {
    fn next_branch(&self, step: usize, board: &Board, search: &SearchState) -> Option<BranchPoint> {
        (**self).next_branch(step, board, search)
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use super::*;

    fn board() -> Board {
        // region 0: 3 cells, region 1: 5 cells, regions 2/3: 4 cells each
        Board::parse(
            "0010\n\
             1111\n\
             2222\n\
             3333",
        ).unwrap()
    }

    #[test]
    fn test_mrv_prefers_smallest_region() {
        let board = board();
        let search = SearchState::new(&board);
        let bp = MinRemainingRanker.next_branch(0, &board, &search).unwrap();
        assert_eq!(bp.region, 0);
        assert_eq!(bp.width(), 3);
    }

    #[test]
    fn test_mrv_ties_break_to_lowest_id() {
        let board = Board::parse(
            "0011\n\
             0011\n\
             2233\n\
             2233",
        ).unwrap();
        let search = SearchState::new(&board);
        let bp = MinRemainingRanker.next_branch(0, &board, &search).unwrap();
        assert_eq!(bp.region, 0);
    }

    #[test]
    fn test_mrv_skips_satisfied_regions() {
        let board = board();
        let mut search = SearchState::new(&board);
        // Occupy region 0 at [0, 1]; whatever gets picked next must be the
        // most constrained of the remaining three.
        assert_eq!(search.place(&board, board.cell([0, 1])), None);
        let bp = MinRemainingRanker.next_branch(1, &board, &search).unwrap();
        assert_ne!(bp.region, 0);
        let open = search.region_open_count(bp.region);
        for g in 1..4 {
            assert!(open <= search.region_open_count(g));
        }
    }

    #[test]
    fn test_candidates_are_row_major() {
        let board = board();
        let search = SearchState::new(&board);
        let mut probe = MinRemainingRanker.next_branch(0, &board, &search).unwrap();
        let mut cells = vec![probe.chosen()];
        while let Some(next) = probe.advance() {
            cells.push(next);
        }
        let mut sorted = cells.clone();
        sorted.sort_unstable();
        assert_eq!(cells, sorted);
    }

    #[test]
    fn test_none_when_all_satisfied() {
        let board = board();
        let mut search = SearchState::new(&board);
        for index in [[0, 1], [1, 3], [2, 0], [3, 2]] {
            assert_eq!(search.place(&board, board.cell(index)), None);
        }
        assert!(MinRemainingRanker.next_branch(4, &board, &search).is_none());
        assert!(FirstUnsatisfiedRanker.next_branch(4, &board, &search).is_none());
    }

    #[test]
    fn test_first_unsatisfied_ignores_counts() {
        let board = board();
        let search = SearchState::new(&board);
        let bp = FirstUnsatisfiedRanker.next_branch(0, &board, &search).unwrap();
        assert_eq!(bp.region, 0);
    }

    #[test]
    fn test_ranker_kind_parses() {
        assert_eq!(RankerKind::from_str("min-remaining"), Ok(RankerKind::MinRemaining));
        assert_eq!(RankerKind::from_str("first-unsatisfied"), Ok(RankerKind::FirstUnsatisfied));
        assert!(RankerKind::from_str("smartest").is_err());
        assert_eq!(RankerKind::MinRemaining.to_string(), "min-remaining");
    }
}

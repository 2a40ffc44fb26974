use lazy_static::lazy_static;
use serde_derive::{Deserialize, Serialize};
use crate::board::{Board, InvalidBoard};
use crate::core::Error;

/// One catalog entry: an id, a human name, and the region grid. The wire
/// format is JSONL, one level per line, the way level stores are shipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    pub regions: Vec<Vec<u8>>,
}

impl Level {
    pub fn size(&self) -> usize {
        self.regions.len()
    }

    pub fn board(&self) -> Result<Board, InvalidBoard> {
        Board::from_regions(&self.regions)
    }
}

/// Parse a JSONL level store: one JSON object per line, blank lines
/// ignored. Levels come back sorted by id.
pub fn parse_jsonl(input: &str) -> Result<Vec<Level>, Error> {
    let mut levels = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let level: Level = serde_json::from_str(line)
            .map_err(|e| Error::new(format!("bad level record on line {}: {}", n + 1, e)))?;
        levels.push(level);
    }
    levels.sort_by_key(|level| level.id);
    Ok(levels)
}

/// Look a level up by id.
pub fn find<'a>(levels: &'a [Level], id: u32) -> Option<&'a Level> {
    levels.iter().find(|level| level.id == id)
}

// A small built-in catalog so the binaries and tests work without a level
// store on disk. Sizes 4 through 11; every entry is solvable, and "pinwheel"
// and "citadel" have unique solutions. Branching on "citadel" without the
// minimum-remaining-values rule wades through well over a thousand steps,
// which the regression tests rely on.
const SAMPLE_JSONL: &str = r#"
{"id":1,"name":"pinwheel","regions":[[0,0,1,0],[1,1,1,1],[2,2,2,2],[3,3,3,3]]}
{"id":2,"name":"orchard","regions":[[0,0,1,1,1],[0,0,1,1,2],[3,1,1,1,2],[3,3,3,2,2],[3,3,3,4,4]]}
{"id":3,"name":"causeway","regions":[[0,0,0,1,1,1],[0,0,0,1,1,2],[3,3,1,1,1,2],[3,3,4,4,2,2],[3,3,4,4,5,5],[3,4,4,4,5,5]]}
{"id":4,"name":"terrace","regions":[[0,0,1,1,1,2,2],[0,0,1,1,2,2,2],[0,1,1,1,2,2,3],[4,4,4,2,2,2,3],[4,4,4,5,5,3,3],[4,4,4,5,5,6,6],[4,4,5,5,5,6,6]]}
{"id":5,"name":"spiral","regions":[[0,0,0,1,1,1,2,2],[0,0,0,1,1,2,2,2],[0,0,1,1,1,2,2,3],[4,4,1,1,2,2,2,3],[4,4,5,5,2,2,3,3],[4,4,5,5,6,6,3,3],[4,5,5,5,6,6,7,7],[5,5,5,6,6,6,7,7]]}
{"id":6,"name":"lattice","regions":[[0,0,1,1,1,2,2,2,3],[0,0,1,1,2,2,2,3,3],[0,1,1,1,2,2,3,3,3],[1,1,1,2,2,2,3,3,4],[5,5,5,2,2,3,3,3,4],[5,5,5,6,6,3,3,4,4],[5,5,5,6,6,7,7,4,4],[5,5,6,6,6,7,7,8,8],[5,6,6,6,7,7,7,8,8]]}
{"id":7,"name":"citadel","regions":[[4,4,1,0,0,0,0,0,0,0,0],[4,4,1,1,1,0,0,0,0,0,0],[2,4,1,1,3,3,3,3,0,0,5],[4,4,1,1,3,8,8,3,0,3,3],[4,4,4,1,1,3,8,3,5,5,5],[4,4,1,1,3,6,6,3,3,5,5],[4,4,1,6,3,6,8,8,5,5,5],[9,4,4,6,6,6,5,5,5,7,5],[9,4,4,6,6,8,8,8,8,8,10],[9,9,6,6,8,8,8,10,8,10,7],[9,6,6,6,6,6,8,10,8,10,7]]}
"#;

lazy_static! {
    pub static ref SAMPLE_LEVELS: Vec<Level> =
        parse_jsonl(SAMPLE_JSONL).expect("embedded sample levels must parse");
}

#[cfg(test)]
mod test {
    use crate::ranker::{FirstUnsatisfiedRanker, MinRemainingRanker};
    use crate::solver::{QueensSolver, SolverView};
    use super::*;

    #[test]
    fn test_parse_jsonl_sorts_and_skips_blanks() {
        let input = "\n{\"id\":2,\"regions\":[[0]]}\n\n{\"id\":1,\"regions\":[[0]]}\n";
        let levels = parse_jsonl(input).unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].id, 1);
        assert_eq!(levels[0].name, "");
        assert_eq!(levels[1].id, 2);
    }

    #[test]
    fn test_parse_jsonl_reports_bad_line() {
        let err = parse_jsonl("{\"id\":1,\"regions\":[[0]]}\nnot json\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_sample_catalog_is_well_formed() {
        assert_eq!(SAMPLE_LEVELS.len(), 7);
        for level in SAMPLE_LEVELS.iter() {
            let board = level.board().unwrap_or_else(|e| {
                panic!("level {} ({}) is invalid: {}", level.id, level.name, e)
            });
            assert_eq!(board.size(), level.size());
        }
        assert_eq!(find(&SAMPLE_LEVELS, 7).map(|l| l.name.as_str()), Some("citadel"));
        assert!(find(&SAMPLE_LEVELS, 99).is_none());
    }

    #[test]
    fn test_every_sample_level_solves_deterministically() {
        let expected: &[(u32, &[[usize; 2]], usize)] = &[
            (1, &[[0, 1], [1, 3], [2, 0], [3, 2]], 11),
            (2, &[[0, 1], [1, 4], [2, 2], [3, 0], [4, 3]], 9),
            (3, &[[0, 0], [1, 5], [2, 3], [3, 1], [4, 4], [5, 2]], 8),
            (4, &[[0, 4], [1, 0], [2, 6], [3, 3], [4, 1], [5, 5], [6, 2]], 11),
            (5, &[[0, 0], [1, 5], [2, 7], [3, 3], [4, 1], [5, 4], [6, 6], [7, 2]], 10),
            (6, &[[0, 4], [1, 0], [2, 6], [3, 8], [4, 3], [5, 1], [6, 5], [7, 7], [8, 2]], 16),
            (
                7,
                &[
                    [0, 8], [1, 3], [2, 0], [3, 4], [4, 2], [5, 10],
                    [6, 5], [7, 9], [8, 6], [9, 1], [10, 7],
                ],
                12,
            ),
        ];
        for &(id, positions, steps) in expected {
            let level = find(&SAMPLE_LEVELS, id).unwrap();
            let board = level.board().unwrap();
            let ranker = MinRemainingRanker;
            let mut solver = QueensSolver::new(&board, &ranker);
            let outcome = solver.solve().unwrap();
            let solution = outcome
                .solution()
                .unwrap_or_else(|| panic!("level {} has no solution", id));
            assert_eq!(solution.positions(), positions, "level {}", id);
            solution.verify(&board).unwrap();
            assert_eq!(solver.step_count(), steps, "level {}", id);
        }
    }

    // Scaling sanity on the 11x11 level, whose solution is unique:
    // minimum-remaining-values solves it in a handful of steps, while
    // branching on the first unsatisfied region instead wades through over
    // a thousand. If someone quietly breaks the heuristic, the bound on
    // the MRV side trips.
    #[test]
    fn test_citadel_scaling_guards_the_heuristic() {
        let board = find(&SAMPLE_LEVELS, 7).unwrap().board().unwrap();
        let mrv = MinRemainingRanker;
        let mut fast = QueensSolver::new(&board, &mrv);
        let outcome = fast.solve().unwrap();
        assert!(outcome.is_solved());
        assert!(
            fast.step_count() <= 64,
            "MRV solve took {} steps; heuristic regressed?",
            fast.step_count(),
        );

        let naive = FirstUnsatisfiedRanker;
        let mut slow = QueensSolver::new(&board, &naive);
        let slow_outcome = slow.solve().unwrap();
        assert!(slow_outcome.is_solved());
        assert!(slow.step_count() > 500);
        // The solution is unique, so both orderings land on it.
        assert_eq!(
            outcome.solution().unwrap().positions(),
            slow_outcome.solution().unwrap().positions(),
        );
    }
}

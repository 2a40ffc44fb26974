use serde_derive::{Deserialize, Serialize};
use crate::board::Board;
use crate::core::{Error, Index};
use crate::ranker::MinRemainingRanker;
use crate::solver::{QueensSolver, SolveOutcome};

/// One solve request: a rectangular grid of region labels, one per cell,
/// contiguously numbered from 0. This is the boundary format an ingestion
/// collaborator (screen scraper, file loader, ...) hands over; everything
/// it does to produce it is outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub regions: Vec<Vec<u8>>,
}

/// The full caller-visible outcome space: a solution, a proven no-solution,
/// or a rejected request. No partial or best-effort results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SolveResponse {
    Solved { positions: Vec<Index> },
    NoSolution,
    InvalidBoard { message: String },
    BadRequest { message: String },
}

/// Serve one request synchronously: validate, solve once with the standard
/// ranker, respond. The exchange is one-shot; there is no streaming and no
/// retained state between requests.
pub fn handle(request: &SolveRequest) -> SolveResponse {
    let board = match Board::from_regions(&request.regions) {
        Ok(board) => board,
        Err(e) => return SolveResponse::InvalidBoard { message: e.to_string() },
    };
    let ranker = MinRemainingRanker;
    let mut solver = QueensSolver::new(&board, &ranker);
    match solver.solve() {
        Ok(SolveOutcome::Solved(solution)) => {
            SolveResponse::Solved { positions: solution.positions().to_vec() }
        }
        Ok(SolveOutcome::Exhausted) => SolveResponse::NoSolution,
        // A fresh engine on a valid board cannot hit an engine error; if it
        // ever does, report it as a rejected request rather than panicking.
        Err(e) => SolveResponse::BadRequest { message: e.to_string() },
    }
}

/// JSON-in/JSON-out wrapper around `handle` for hosts that speak text.
pub fn handle_json(input: &str) -> Result<String, Error> {
    let response = match serde_json::from_str::<SolveRequest>(input) {
        Ok(request) => handle(&request),
        Err(e) => SolveResponse::BadRequest { message: e.to_string() },
    };
    serde_json::to_string(&response).map_err(|e| Error::new(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_solved_response() {
        let request = SolveRequest {
            regions: vec![
                vec![0, 0, 1, 0],
                vec![1, 1, 1, 1],
                vec![2, 2, 2, 2],
                vec![3, 3, 3, 3],
            ],
        };
        let response = handle(&request);
        assert_eq!(
            response,
            SolveResponse::Solved {
                positions: vec![[0, 1], [1, 3], [2, 0], [3, 2]],
            },
        );
    }

    #[test]
    fn test_no_solution_response() {
        let request = SolveRequest {
            regions: vec![
                vec![0, 1, 1],
                vec![2, 2, 2],
                vec![2, 2, 2],
            ],
        };
        assert_eq!(handle(&request), SolveResponse::NoSolution);
    }

    #[test]
    fn test_invalid_board_response() {
        let request = SolveRequest {
            regions: vec![vec![0, 1], vec![1]],
        };
        match handle(&request) {
            SolveResponse::InvalidBoard { message } => {
                assert!(message.contains("not square"), "{}", message);
            }
            other => panic!("expected InvalidBoard, got {:?}", other),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let input = r#"{"regions":[[0,0,1,0],[1,1,1,1],[2,2,2,2],[3,3,3,3]]}"#;
        let output = handle_json(input).unwrap();
        let parsed: SolveResponse = serde_json::from_str(&output).unwrap();
        assert_eq!(
            parsed,
            SolveResponse::Solved {
                positions: vec![[0, 1], [1, 3], [2, 0], [3, 2]],
            },
        );
        assert!(output.contains(r#""status":"solved"#));
    }

    #[test]
    fn test_malformed_json_is_a_bad_request() {
        let output = handle_json("{definitely not json").unwrap();
        let parsed: SolveResponse = serde_json::from_str(&output).unwrap();
        match parsed {
            SolveResponse::BadRequest { .. } => {}
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }
}

use std::fmt::{self, Debug};
use strum_macros::Display as StrumDisplay;
use crate::board::Board;
use crate::core::{BranchPoint, DeadEnd, Error, Index};
use crate::ranker::Ranker;
use crate::search::SearchState;
use crate::solution::Solution;

/// The engine's state machine. `Ready` is entered on construction;
/// `Advancing` and `Backtracking` are the internal transitions of the
/// search; `Solved` and `Exhausted` are terminal. A terminal engine rejects
/// further stepping or solving: re-solving requires a fresh engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay)]
pub enum SolverState {
    Ready,
    Advancing,
    Backtracking,
    Solved,
    Exhausted,
}

/// A read-only view on the engine, for observers and UI surfaces that must
/// not depend on the concrete ranker type.
pub trait SolverView {
    fn step_count(&self) -> usize;
    fn solver_state(&self) -> SolverState;
    fn is_done(&self) -> bool;
    fn board(&self) -> &Board;
    fn search(&self) -> &SearchState;
    /// The dead end discovered by the most recent step, if it hit one.
    fn dead_end(&self) -> Option<DeadEnd>;
    /// Width of the decision currently on top of the stack.
    fn last_branch_width(&self) -> Option<usize>;
    fn most_recent_placement(&self) -> Option<Index>;
    /// While unwinding: how many steps the most recently popped decision
    /// had been on the stack. None while advancing.
    fn backtracked_steps(&self) -> Option<usize>;
}

/// Mostly for debugging purposes: lets the caller of `solve` inspect the
/// engine after every step without inverting control over the whole solving
/// process.
pub trait StepObserver {
    fn after_step(&mut self, solver: &dyn SolverView);
}

const ENGINE_DONE: Error =
    Error::new_const("Engine already reached a terminal state; build a fresh one to re-solve");

/// Outcome of a completed search. Exhaustion is a legitimate, expected
/// result for some boards, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved(Solution),
    Exhausted,
}

impl SolveOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }

    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Solved(s) => Some(s),
            SolveOutcome::Exhausted => None,
        }
    }

    pub fn into_solution(self) -> Option<Solution> {
        match self {
            SolveOutcome::Solved(s) => Some(s),
            SolveOutcome::Exhausted => None,
        }
    }
}

/// Depth-first solver with constraint propagation. The low-level API:
/// `step()` drives one transition at a time, so an embedding host can bound
/// work (by steps or wall clock) and treat a cutoff as exhaustion-
/// equivalent. Most callers want `FindFirstSolution`.
///
/// Given the same board, branches are always explored in the same order
/// (the ranker is deterministic and candidates are row-major), so the first
/// solution found — and the whole step trace — is reproducible.
pub struct QueensSolver<'a, R: Ranker> {
    board: &'a Board,
    ranker: &'a R,
    search: SearchState,
    stack: Vec<BranchPoint>,
    state: SolverState,
    step: usize,
    dead_end: Option<DeadEnd>,
    backtracked_steps: Option<usize>,
}

impl<'a, R: Ranker> Debug for QueensSolver<'a, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State ({}, step {}):\n{:?}",
            self.state, self.step, self.search,
        )
    }
}

impl<'a, R: Ranker> SolverView for QueensSolver<'a, R> {
    fn step_count(&self) -> usize {
        self.step
    }

    fn solver_state(&self) -> SolverState {
        self.state
    }

    fn is_done(&self) -> bool {
        matches!(self.state, SolverState::Solved | SolverState::Exhausted)
    }

    fn board(&self) -> &Board {
        self.board
    }

    fn search(&self) -> &SearchState {
        &self.search
    }

    fn dead_end(&self) -> Option<DeadEnd> {
        self.dead_end
    }

    fn last_branch_width(&self) -> Option<usize> {
        self.stack.last().map(BranchPoint::width)
    }

    fn most_recent_placement(&self) -> Option<Index> {
        self.stack.last().map(|bp| self.board.pos(bp.chosen()))
    }

    fn backtracked_steps(&self) -> Option<usize> {
        self.backtracked_steps
    }
}

impl<'a, R: Ranker> QueensSolver<'a, R> {
    /// Builds the engine in `Ready` with a fresh all-open search state.
    pub fn new(board: &'a Board, ranker: &'a R) -> Self {
        QueensSolver {
            board,
            ranker,
            search: SearchState::new(board),
            stack: Vec::new(),
            state: SolverState::Ready,
            step: 0,
            dead_end: None,
            backtracked_steps: None,
        }
    }

    fn apply(&mut self, decision: BranchPoint) {
        self.dead_end = self.search.place(self.board, decision.chosen());
        self.stack.push(decision);
        self.state = if self.dead_end.is_none() {
            SolverState::Advancing
        } else {
            SolverState::Backtracking
        };
    }

    /// One transition of the state machine: take the ranker's next decision,
    /// or unwind one frame. Errors only on a terminal engine.
    pub fn step(&mut self) -> Result<(), Error> {
        self.step += 1;
        match self.state {
            SolverState::Ready | SolverState::Advancing => {
                self.backtracked_steps = None;
                match self.ranker.next_branch(self.step, self.board, &self.search) {
                    Some(decision) => self.apply(decision),
                    None => {
                        debug_assert!(self.search.is_complete());
                        self.dead_end = None;
                        self.state = SolverState::Solved;
                    }
                }
                Ok(())
            }
            SolverState::Backtracking => {
                self.dead_end = None;
                match self.stack.pop() {
                    Some(mut decision) => {
                        self.backtracked_steps = Some(self.step - decision.branch_step);
                        self.search.unplace(self.board);
                        if decision.advance().is_some() {
                            self.apply(decision);
                        }
                        // else: keep unwinding from the parent decision.
                    }
                    None => {
                        self.backtracked_steps = Some(self.step);
                        self.state = SolverState::Exhausted;
                    }
                }
                Ok(())
            }
            SolverState::Solved | SolverState::Exhausted => Err(ENGINE_DONE),
        }
    }

    /// Run the search to completion. A terminal engine rejects the call;
    /// otherwise this never fails for a structurally valid board, and
    /// "no solution" comes back as `SolveOutcome::Exhausted`.
    pub fn solve(&mut self) -> Result<SolveOutcome, Error> {
        if self.is_done() {
            return Err(ENGINE_DONE);
        }
        while !self.is_done() {
            self.step()?;
        }
        self.outcome()
    }

    fn outcome(&self) -> Result<SolveOutcome, Error> {
        match self.state {
            SolverState::Solved => {
                Ok(SolveOutcome::Solved(Solution::extract(self.board, &self.search)?))
            }
            _ => Ok(SolveOutcome::Exhausted),
        }
    }
}

/// Find the first solution under the deterministic ordering, optionally
/// reporting every step to an observer.
pub struct FindFirstSolution<'a, R: Ranker> {
    solver: QueensSolver<'a, R>,
    observer: Option<&'a mut dyn StepObserver>,
}

impl<'a, R: Ranker> FindFirstSolution<'a, R> {
    pub fn new(
        board: &'a Board,
        ranker: &'a R,
        observer: Option<&'a mut dyn StepObserver>,
    ) -> Self {
        FindFirstSolution { solver: QueensSolver::new(board, ranker), observer }
    }

    pub fn view(&self) -> &dyn SolverView {
        &self.solver
    }

    pub fn step(&mut self) -> Result<&dyn SolverView, Error> {
        self.solver.step()?;
        if let Some(observer) = &mut self.observer {
            observer.after_step(&self.solver);
        }
        Ok(&self.solver)
    }

    pub fn solve(&mut self) -> Result<SolveOutcome, Error> {
        if self.solver.is_done() {
            return Err(ENGINE_DONE);
        }
        while !self.solver.is_done() {
            self.step()?;
        }
        self.solver.outcome()
    }
}

#[cfg(test)]
mod test {
    use crate::core::Unit;
    use crate::ranker::MinRemainingRanker;
    use crate::search::test_util::assert_consistent;
    use super::*;

    fn unique4() -> Board {
        Board::parse(
            "0010\n\
             1111\n\
             2222\n\
             3333",
        ).unwrap()
    }

    fn row_trapped3() -> Board {
        // Regions 0 and 1 both live entirely in row 0, so some row can
        // never be satisfied. Construction is fine; solving must exhaust.
        Board::parse(
            "011\n\
             222\n\
             222",
        ).unwrap()
    }

    #[test]
    fn test_unique_4x4_solved_exactly() {
        let board = unique4();
        let ranker = MinRemainingRanker;
        let mut solver = QueensSolver::new(&board, &ranker);
        let outcome = solver.solve().unwrap();
        let solution = outcome.solution().expect("4x4 board has a solution");
        assert_eq!(solution.positions(), &[[0, 1], [1, 3], [2, 0], [3, 2]]);
        solution.verify(&board).unwrap();
        assert_eq!(solver.solver_state(), SolverState::Solved);
        assert_eq!(solver.step_count(), 11);
    }

    #[test]
    fn test_unsolvable_exhausts() {
        let board = row_trapped3();
        let ranker = MinRemainingRanker;
        let mut solver = QueensSolver::new(&board, &ranker);
        let outcome = solver.solve().unwrap();
        assert_eq!(outcome, SolveOutcome::Exhausted);
        assert!(!outcome.is_solved());
        assert_eq!(solver.solver_state(), SolverState::Exhausted);
        assert_eq!(solver.step_count(), 3);
    }

    #[test]
    fn test_single_cell_board() {
        let board = Board::from_regions(&[vec![0]]).unwrap();
        let ranker = MinRemainingRanker;
        let mut solver = QueensSolver::new(&board, &ranker);
        let outcome = solver.solve().unwrap();
        assert_eq!(outcome.solution().unwrap().positions(), &[[0, 0]]);
    }

    #[test]
    fn test_deterministic_across_fresh_engines() {
        let board = unique4();
        let ranker = MinRemainingRanker;
        let mut first = QueensSolver::new(&board, &ranker);
        let a = first.solve().unwrap();
        let mut second = QueensSolver::new(&board, &ranker);
        let b = second.solve().unwrap();
        assert_eq!(a, b);
        assert_eq!(first.step_count(), second.step_count());
    }

    #[test]
    fn test_terminal_engine_rejects_resolving() {
        let board = unique4();
        let ranker = MinRemainingRanker;
        let mut solver = QueensSolver::new(&board, &ranker);
        solver.solve().unwrap();
        assert_eq!(solver.solve(), Err(ENGINE_DONE));
        assert_eq!(solver.step(), Err(ENGINE_DONE));
    }

    #[test]
    fn test_stepwise_drive_matches_solve() {
        let board = unique4();
        let ranker = MinRemainingRanker;
        let mut stepped = QueensSolver::new(&board, &ranker);
        while !stepped.is_done() {
            stepped.step().unwrap();
            assert_consistent(stepped.search(), &board);
        }
        let mut whole = QueensSolver::new(&board, &ranker);
        let outcome = whole.solve().unwrap();
        assert_eq!(stepped.step_count(), whole.step_count());
        assert_eq!(
            Solution::extract(&board, stepped.search()).unwrap(),
            outcome.into_solution().unwrap(),
        );
    }

    #[test]
    fn test_dead_end_reported_while_backtracking() {
        let board = row_trapped3();
        let ranker = MinRemainingRanker;
        let mut solver = QueensSolver::new(&board, &ranker);
        // First step places region 0's only cell, wiping out region 1.
        solver.step().unwrap();
        assert_eq!(solver.solver_state(), SolverState::Backtracking);
        let dead = solver.dead_end().expect("propagation hit a dead end");
        assert_eq!(dead.unit, Unit::Region);
        assert_eq!(dead.index, 1);
    }

    #[test]
    fn test_backtracked_steps_reported() {
        let board = row_trapped3();
        let ranker = MinRemainingRanker;
        let mut solver = QueensSolver::new(&board, &ranker);
        solver.step().unwrap();
        assert_eq!(solver.backtracked_steps(), None);
        // Pops the decision taken at step 1, one step later.
        solver.step().unwrap();
        assert_eq!(solver.backtracked_steps(), Some(1));
        solver.step().unwrap();
        assert_eq!(solver.solver_state(), SolverState::Exhausted);
        assert_eq!(solver.backtracked_steps(), Some(3));
    }

    struct DeadEndCounter(usize);
    impl StepObserver for DeadEndCounter {
        fn after_step(&mut self, solver: &dyn SolverView) {
            if solver.dead_end().is_some() {
                self.0 += 1;
            }
        }
    }

    #[test]
    fn test_observer_sees_every_step() {
        let board = row_trapped3();
        let ranker = MinRemainingRanker;
        let mut counter = DeadEndCounter(0);
        let mut finder = FindFirstSolution::new(&board, &ranker, Some(&mut counter));
        let outcome = finder.solve().unwrap();
        assert_eq!(outcome, SolveOutcome::Exhausted);
        assert_eq!(counter.0, 1);
    }

    #[test]
    fn test_find_first_on_solvable_board() {
        let board = unique4();
        let ranker = MinRemainingRanker;
        let mut finder = FindFirstSolution::new(&board, &ranker, None);
        let outcome = finder.solve().unwrap();
        assert_eq!(
            outcome.solution().unwrap().positions(),
            &[[0, 1], [1, 3], [2, 0], [3, 2]],
        );
    }
}

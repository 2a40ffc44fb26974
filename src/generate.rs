use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use crate::board::{Board, MAX_BOARD_SIZE};
use crate::core::Error;

/// No marker arrangement exists on 2x2 or 3x3 boards (any two markers in
/// adjacent rows would touch diagonally or share a column), so those sizes
/// cannot be generated.
const UNSUPPORTED_SIZE: Error =
    Error::new_const("No solvable board exists for sizes 2 and 3");

/// Generate a random solvable board: first sample a marker arrangement
/// with distinct columns and no diagonal touching, then grow the regions
/// outward from the markers, one random frontier cell at a time. The seed
/// arrangement is a solution of the resulting board by construction, so
/// generated boards are always solvable (though rarely uniquely).
pub fn generate<R: Rng>(size: usize, rng: &mut R) -> Result<Board, Error> {
    if size == 0 {
        return Err(Error::new_const("Cannot generate an empty board"));
    }
    if size > MAX_BOARD_SIZE {
        return Err(Error::new(format!("Board size {} exceeds {}", size, MAX_BOARD_SIZE)));
    }
    if size == 2 || size == 3 {
        return Err(UNSUPPORTED_SIZE);
    }
    let cols = place_markers(size, rng);
    let regions = grow_regions(size, &cols, rng);
    Board::from_regions(&regions).map_err(|e| Error::new(format!("generator bug: {}", e)))
}

/// Generate with a fixed seed, for reproducible tests and benchmarks.
pub fn generate_seeded(size: usize, seed: u64) -> Result<Board, Error> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate(size, &mut rng)
}

/// One marker per row: a random permutation of columns where vertically
/// adjacent markers are never in horizontally adjacent columns. Found by
/// row-by-row backtracking over shuffled candidates; a valid arrangement
/// exists for every size except 2 and 3, so this always terminates.
fn place_markers<R: Rng>(size: usize, rng: &mut R) -> Vec<usize> {
    let mut cols = Vec::with_capacity(size);
    let mut used = vec![false; size];
    let placed = try_rows(size, rng, &mut cols, &mut used);
    debug_assert!(placed, "no marker arrangement for size {}", size);
    cols
}

fn try_rows<R: Rng>(size: usize, rng: &mut R, cols: &mut Vec<usize>, used: &mut [bool]) -> bool {
    if cols.len() == size {
        return true;
    }
    let mut candidates: Vec<usize> = (0..size)
        .filter(|&c| {
            !used[c] && cols.last().map_or(true, |&prev| c.abs_diff(prev) != 1)
        })
        .collect();
    candidates.shuffle(rng);
    for c in candidates {
        cols.push(c);
        used[c] = true;
        if try_rows(size, rng, cols, used) {
            return true;
        }
        cols.pop();
        used[c] = false;
    }
    false
}

/// Multi-source random growth: every cell starts unassigned except the
/// markers (cell of marker i seeds region i); each round assigns one random
/// unassigned cell that touches an assigned cell orthogonally, taking that
/// neighbor's label. Regions come out contiguous and cover the grid.
fn grow_regions<R: Rng>(size: usize, cols: &[usize], rng: &mut R) -> Vec<Vec<u8>> {
    let mut region: Vec<Vec<Option<u8>>> = vec![vec![None; size]; size];
    for (r, &c) in cols.iter().enumerate() {
        region[r][c] = Some(r as u8);
    }
    let mut unassigned = size * size - size;
    let mut frontier = Vec::new();
    while unassigned > 0 {
        frontier.clear();
        for r in 0..size {
            for c in 0..size {
                if region[r][c].is_some() {
                    continue;
                }
                for (nr, nc) in orthogonal(size, r, c) {
                    if let Some(label) = region[nr][nc] {
                        frontier.push((r, c, label));
                    }
                }
            }
        }
        let (r, c, label) = frontier[rng.random_range(0..frontier.len())];
        region[r][c] = Some(label);
        unassigned -= 1;
    }
    region
        .into_iter()
        .map(|row| row.into_iter().map(|g| g.unwrap_or(0)).collect())
        .collect()
}

fn orthogonal(size: usize, r: usize, c: usize) -> impl Iterator<Item = (usize, usize)> {
    const STEPS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    STEPS.iter().filter_map(move |&(dr, dc)| {
        let nr = r as i32 + dr;
        let nc = c as i32 + dc;
        if nr >= 0 && nr < size as i32 && nc >= 0 && nc < size as i32 {
            Some((nr as usize, nc as usize))
        } else {
            None
        }
    })
}

#[cfg(test)]
mod test {
    use crate::ranker::MinRemainingRanker;
    use crate::solver::QueensSolver;
    use super::*;

    #[test]
    fn test_rejects_degenerate_sizes() {
        assert!(generate_seeded(0, 1).is_err());
        assert_eq!(generate_seeded(2, 1), Err(UNSUPPORTED_SIZE));
        assert_eq!(generate_seeded(3, 1), Err(UNSUPPORTED_SIZE));
    }

    #[test]
    fn test_single_cell_generation() {
        let board = generate_seeded(1, 1).unwrap();
        assert_eq!(board.size(), 1);
    }

    #[test]
    fn test_same_seed_same_board() {
        let a = generate_seeded(8, 42).unwrap();
        let b = generate_seeded(8, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_boards_are_solvable() {
        for (size, seed) in [(4, 0), (6, 1), (8, 2), (9, 3), (11, 4)] {
            let board = generate_seeded(size, seed).unwrap();
            let ranker = MinRemainingRanker;
            let mut solver = QueensSolver::new(&board, &ranker);
            let outcome = solver.solve().unwrap();
            let solution = outcome
                .solution()
                .unwrap_or_else(|| panic!("size {} seed {} did not solve", size, seed));
            solution.verify(&board).unwrap();
        }
    }
}

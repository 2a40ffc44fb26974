use std::io::Read;
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use queens_dfs::board::Board;
use queens_dfs::debug::{DbgObserver, Sample};
use queens_dfs::levels::{find, SAMPLE_LEVELS};
use queens_dfs::ranker::MinRemainingRanker;
use queens_dfs::solver::{FindFirstSolution, SolveOutcome, SolverView};

const USAGE: &str = "usage: solve <grid-file | - | --level ID> [--trace]

The grid file holds one base-36 region label per cell, one row per line;
`-` reads the grid from stdin. `--level ID` solves a level from the built-in
catalog. `--trace` prints every engine step.";

fn load_board(source: &str) -> Result<Board> {
    if let Some(id) = source.strip_prefix("--level=") {
        return board_for_level(id.parse().wrap_err("bad level id")?);
    }
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read grid from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .wrap_err_with(|| format!("failed to read grid from {}", source))?
    };
    Board::parse(&text).map_err(|e| eyre!("invalid board: {}", e))
}

fn board_for_level(id: u32) -> Result<Board> {
    let level = find(&SAMPLE_LEVELS, id)
        .ok_or_else(|| eyre!("no catalog level with id {}", id))?;
    level.board().map_err(|e| eyre!("catalog level {} is invalid: {}", id, e))
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let trace = args.iter().any(|a| a == "--trace");
    let sources: Vec<&str> = args
        .iter()
        .filter(|a| *a != "--trace")
        .map(String::as_str)
        .collect();
    let board = match sources.as_slice() {
        ["--level"] => bail!("--level needs an id, e.g. --level=7"),
        ["--level", id] => board_for_level(id.parse().wrap_err("bad level id")?)?,
        [source] => load_board(source)?,
        _ => bail!("{}", USAGE),
    };

    let ranker = MinRemainingRanker;
    let mut dbg = DbgObserver::new();
    if trace {
        dbg.sample_print(Sample::every_n(1));
    }
    let mut finder = FindFirstSolution::new(&board, &ranker, Some(&mut dbg));
    match finder.solve().map_err(|e| eyre!("engine error: {}", e))? {
        SolveOutcome::Solved(solution) => {
            println!("Solved in {} steps:", finder.view().step_count());
            print!("{}", solution);
        }
        SolveOutcome::Exhausted => {
            println!(
                "No solution exists (proved in {} steps).",
                finder.view().step_count(),
            );
        }
    }
    Ok(())
}

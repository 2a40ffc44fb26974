use std::str::FromStr;
use std::time::Instant;
use color_eyre::eyre::{eyre, Result, WrapErr};
use serde_derive::Serialize;
use strum::IntoEnumIterator;
use queens_dfs::debug::{DbgObserver, Sample};
use queens_dfs::levels::SAMPLE_LEVELS;
use queens_dfs::ranker::RankerKind;
use queens_dfs::solver::{FindFirstSolution, SolverView};

const RUNS: u32 = 5;

#[derive(Debug, Clone, Serialize)]
struct BenchRecord {
    level: u32,
    name: String,
    size: usize,
    ranker: String,
    solved: bool,
    steps: usize,
    mean_micros: f64,
}

fn bench_level(level: &queens_dfs::levels::Level, kind: RankerKind) -> Result<BenchRecord> {
    let board = level
        .board()
        .map_err(|e| eyre!("catalog level {} is invalid: {}", level.id, e))?;
    let ranker = kind.build();
    let mut steps = 0;
    let mut solved = false;
    let mut total_micros = 0.0;
    for run in 0..RUNS {
        let timer = Instant::now();
        let mut finder = FindFirstSolution::new(&board, &ranker, None);
        let outcome = finder.solve().map_err(|e| eyre!("engine error: {}", e))?;
        total_micros += timer.elapsed().as_secs_f64() * 1e6;
        if run == 0 {
            steps = finder.view().step_count();
            solved = outcome.is_solved();
        }
    }
    Ok(BenchRecord {
        level: level.id,
        name: level.name.clone(),
        size: level.size(),
        ranker: kind.to_string(),
        solved,
        steps,
        mean_micros: total_micros / RUNS as f64,
    })
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut kinds: Vec<RankerKind> = RankerKind::iter().collect();
    let mut json_out = None;
    let mut figure_out = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--json" => {
                json_out = Some(it.next().ok_or_else(|| eyre!("--json needs a path"))?.clone());
            }
            "--figure" => {
                figure_out =
                    Some(it.next().ok_or_else(|| eyre!("--figure needs a path"))?.clone());
            }
            other => {
                kinds = vec![RankerKind::from_str(other)
                    .map_err(|_| eyre!("unknown ranker {:?}", other))?];
            }
        }
    }

    let mut records = Vec::new();
    println!(
        "{:<8} {:<10} {:>4}  {:<18} {:>8} {:>12}",
        "level", "name", "size", "ranker", "steps", "mean (us)",
    );
    for kind in &kinds {
        for level in SAMPLE_LEVELS.iter() {
            let record = bench_level(level, *kind)?;
            println!(
                "{:<8} {:<10} {:>4}  {:<18} {:>8} {:>12.1}",
                record.level, record.name, record.size, record.ranker,
                record.steps, record.mean_micros,
            );
            records.push(record);
        }
    }

    if let Some(path) = json_out {
        let json = serde_json::to_string_pretty(&records)?;
        std::fs::write(&path, json).wrap_err_with(|| format!("writing {}", path))?;
        println!("Wrote {}", path);
    }

    if let Some(path) = figure_out {
        // Re-run the slowest configuration with a stats observer so the
        // figure reflects a real step trace.
        let level = SAMPLE_LEVELS
            .iter()
            .max_by_key(|l| l.size())
            .ok_or_else(|| eyre!("empty catalog"))?;
        let board = level.board().map_err(|e| eyre!("invalid level: {}", e))?;
        let ranker = kinds[0].build();
        let mut dbg = DbgObserver::new();
        dbg.sample_stats(&path, Sample::at_end());
        let mut finder = FindFirstSolution::new(&board, &ranker, Some(&mut dbg));
        finder.solve().map_err(|e| eyre!("engine error: {}", e))?;
        println!("Wrote {}", path);
    }
    Ok(())
}

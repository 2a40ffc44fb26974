use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use rand::distr::{Bernoulli, Distribution};
use rand::rngs::ThreadRng;
use plotters::chart::ChartBuilder;
use plotters::prelude::{BitMapBackend, IntoDrawingArea, IntoSegmentedCoord, Rectangle, SegmentValue};
use plotters::style::{Color, BLUE, WHITE};
use crate::solver::{SolverState, SolverView, StepObserver};

/// Summary numbers for one histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct DistStat {
    pub count: usize,
    pub total: usize,
    pub max: usize,
    pub max_count: usize,
    pub mean: f64,
}

impl DistStat {
    pub fn from_histogram(hist: &HashMap<usize, usize>) -> DistStat {
        let mut count = 0;
        let mut total = 0;
        let mut max = 0;
        let mut max_count = 0;
        for (&value, &n) in hist {
            count += n;
            total += value * n;
            max = max.max(value);
            max_count = max_count.max(n);
        }
        let mean = if count > 0 { total as f64 / count as f64 } else { 0.0 };
        DistStat { count, total, max, max_count, mean }
    }
}

enum SampleState {
    Never,
    AtEnd,
    EveryN(usize, usize),
    Probability(Bernoulli, ThreadRng),
    Time(Duration, SystemTime),
}

/// A sampling policy for when an observer should do its (possibly
/// expensive) reporting work.
pub struct Sample {
    state: SampleState,
}

impl Sample {
    pub fn never() -> Self {
        Sample { state: SampleState::Never }
    }

    pub fn at_end() -> Self {
        Sample { state: SampleState::AtEnd }
    }

    pub fn every_n(n: usize) -> Self {
        Sample { state: SampleState::EveryN(n, 0) }
    }

    pub fn probability(p: f64) -> Self {
        Sample {
            state: SampleState::Probability(
                Bernoulli::new(p).unwrap_or_else(|_| panic!("bad probability: {}", p)),
                rand::rng(),
            ),
        }
    }

    pub fn time(every: Duration) -> Self {
        Sample { state: SampleState::Time(every, SystemTime::now()) }
    }

    /// The final step always samples, so end-of-run reporting never gets
    /// skipped by an unlucky policy.
    pub fn sample(&mut self, solver: &dyn SolverView) -> bool {
        match &mut self.state {
            SampleState::Never => false,
            SampleState::AtEnd => solver.is_done(),
            SampleState::EveryN(n, seen) => {
                *seen += 1;
                if *seen >= *n || solver.is_done() {
                    *seen = 0;
                    true
                } else {
                    false
                }
            }
            SampleState::Probability(dist, rng) => dist.sample(rng) || solver.is_done(),
            SampleState::Time(every, last) => {
                let now = SystemTime::now();
                let elapsed = now.duration_since(*last).unwrap_or(Duration::ZERO);
                if elapsed >= *every || solver.is_done() {
                    *last = now;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// An observer that does nothing; for call sites that want the observed
/// code path without any reporting.
pub struct NullObserver;

impl StepObserver for NullObserver {
    fn after_step(&mut self, _: &dyn SolverView) {}
}

/// Collects step statistics and optionally prints sampled engine states
/// and dumps a histogram figure. The histograms answer the questions that
/// matter when a solve misbehaves: how wide were the decisions, how deep
/// did placements get, how long were the backtrack runs, and which units
/// kept dying.
pub struct DbgObserver {
    print_sample: Sample,
    stats_out: Option<(String, Sample)>,
    width_hist: HashMap<usize, usize>,
    depth_hist: HashMap<usize, usize>,
    backtrack_hist: HashMap<usize, usize>,
    dead_end_units: HashMap<String, usize>,
    backtrack_run: usize,
    steps: usize,
}

impl DbgObserver {
    pub fn new() -> Self {
        DbgObserver {
            print_sample: Sample::never(),
            stats_out: None,
            width_hist: HashMap::new(),
            depth_hist: HashMap::new(),
            backtrack_hist: HashMap::new(),
            dead_end_units: HashMap::new(),
            backtrack_run: 0,
            steps: 0,
        }
    }

    pub fn sample_print(&mut self, sample: Sample) -> &mut Self {
        self.print_sample = sample;
        self
    }

    pub fn sample_stats<S: Into<String>>(&mut self, filename: S, sample: Sample) -> &mut Self {
        self.stats_out = Some((filename.into(), sample));
        self
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn dead_ends(&self) -> usize {
        self.dead_end_units.values().sum()
    }

    fn update(&mut self, solver: &dyn SolverView) {
        self.steps += 1;
        *self.depth_hist.entry(solver.search().depth()).or_default() += 1;
        match solver.solver_state() {
            SolverState::Advancing => {
                if let Some(width) = solver.last_branch_width() {
                    *self.width_hist.entry(width).or_default() += 1;
                }
                if self.backtrack_run > 0 {
                    *self.backtrack_hist.entry(self.backtrack_run).or_default() += 1;
                    self.backtrack_run = 0;
                }
            }
            SolverState::Backtracking => {
                self.backtrack_run += 1;
            }
            _ => {
                if self.backtrack_run > 0 {
                    *self.backtrack_hist.entry(self.backtrack_run).or_default() += 1;
                    self.backtrack_run = 0;
                }
            }
        }
        if let Some(dead) = solver.dead_end() {
            *self.dead_end_units.entry(dead.unit.to_string()).or_default() += 1;
        }
    }

    pub fn print(&self, solver: &dyn SolverView) {
        let headline = match solver.solver_state() {
            SolverState::Solved => "SOLVED".to_string(),
            SolverState::Exhausted => "EXHAUSTED".to_string(),
            state => match solver.dead_end() {
                Some(dead) => format!("{} ({})", state, dead),
                None => state.to_string(),
            },
        };
        print!(
            "step {}: {}\n{:?}",
            solver.step_count(),
            headline,
            solver.search(),
        );
    }

    pub fn dump_stats(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        println!("Steps: {}", self.steps);
        println!("Dead ends: {:?}", self.dead_end_units);
        let area = BitMapBackend::new(filename, (640, 640)).into_drawing_area();
        area.fill(&WHITE)?;
        let panes = area.split_evenly((2, 2));
        let charts = [
            ("Decision width per advance", &self.width_hist),
            ("Placements on board per step", &self.depth_hist),
            ("Backtrack run length", &self.backtrack_hist),
        ];
        for (pane, (caption, hist)) in panes.iter().zip(charts.iter()) {
            let stat = DistStat::from_histogram(hist);
            let mut chart = ChartBuilder::on(pane)
                .caption(format!("{} (mean {:.2})", caption, stat.mean), ("sans-serif", 14))
                .margin(5)
                .x_label_area_size(20)
                .y_label_area_size(24)
                .build_cartesian_2d(
                    (0..stat.max.max(1) as i32).into_segmented(),
                    0..stat.max_count.max(1) as i32,
                )?;
            chart.configure_mesh().draw()?;
            chart.draw_series(hist.iter().map(|(&value, &n)| {
                let x0 = SegmentValue::Exact(value as i32);
                let x1 = SegmentValue::Exact(value as i32 + 1);
                Rectangle::new([(x0, 0), (x1, n as i32)], BLUE.filled())
            }))?;
        }
        Ok(())
    }
}

impl Default for DbgObserver {
    fn default() -> Self {
        DbgObserver::new()
    }
}

impl StepObserver for DbgObserver {
    fn after_step(&mut self, solver: &dyn SolverView) {
        self.update(solver);
        if self.print_sample.sample(solver) {
            self.print(solver);
        }
        if let Some((filename, sample)) = &mut self.stats_out {
            let filename = filename.clone();
            if sample.sample(solver) {
                self.dump_stats(&filename)
                    .unwrap_or_else(|e| eprintln!("Failed to dump stats: {}", e));
            }
        }
    }
}

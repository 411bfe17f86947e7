//! `shardlife run`: a headless run that prints the final board.

use std::collections::VecDeque;

use anyhow::{Context, Result, bail};

use crate::{
    actor::{BoardSpec, ShardPlan, Simulation},
    config::cfg,
    grid::{Encoding, Grid, to_json},
    log,
    logger::ProgressLine,
};

/// How many past generations a repeat is looked for in.
const CYCLE_WINDOW: usize = 10;

/// Result of driving a simulation.
struct Report {
    completed: u64,
    grid: Grid,
    cycle: Option<Cycle>,
}

/// The board at `generation` repeats the one `period` generations earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cycle {
    generation: u64,
    period: usize,
}

pub fn run(generations: u64, verify: bool, encoding: Encoding) -> Result<()> {
    let config = cfg();
    let plan = ShardPlan::from_config(&config);
    let spec = config.board_spec()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    let report = rt.block_on(async {
        let mut simulation = Simulation::bootstrap(&plan, &spec)
            .await
            .context("failed to bootstrap the board")?;
        if let Some(layout) = simulation.layout() {
            log!(
                "run";
                "{}x{} board on {}x{} shards",
                spec.width,
                spec.height,
                layout.columns(),
                layout.rows()
            );
        }

        let report = drive(&mut simulation, generations).await;
        simulation.close().await;
        report
    })?;

    if report.completed < generations {
        log!("run"; "stopped after {} of {} generations", report.completed, generations);
    }
    if let Some(cycle) = report.cycle {
        log!(
            "run";
            "generation {} repeats generation {} (period {})",
            cycle.generation,
            cycle.generation - cycle.period as u64,
            cycle.period
        );
    }
    if verify {
        verify_against_single(&spec, report.completed, &report.grid)?;
        log!("run"; "verified against the unsharded board");
    }

    print!("{}", to_json(&report.grid, encoding));
    Ok(())
}

async fn drive(simulation: &mut Simulation, generations: u64) -> Result<Report> {
    let mut detector = CycleDetector::new(CYCLE_WINDOW);
    let mut cycle = None;
    let mut grid = simulation.snapshot().await?.grid;
    detector.observe(grid.fingerprint());

    let progress = ProgressLine::new("run", &[("generation", generations)]);
    let mut completed = 0;
    while completed < generations {
        if simulation.step(1, crate::core::is_shutdown).await? == 0 {
            break;
        }
        completed += 1;
        progress.inc("generation");

        // Only the first repeat is reported, after that snapshots are skipped
        if cycle.is_none() {
            grid = simulation.snapshot().await?.grid;
            cycle = detector.observe(grid.fingerprint()).map(|period| Cycle {
                generation: completed,
                period,
            });
        }
    }
    progress.finish();

    let grid = simulation.snapshot().await?.grid;
    Ok(Report {
        completed,
        grid,
        cycle,
    })
}

/// Step the whole board on one thread and compare.
fn verify_against_single(spec: &BoardSpec, generations: u64, sharded: &Grid) -> Result<()> {
    let mut single = spec.seed.build(spec.width, spec.height)?;
    for _ in 0..generations {
        single = single.step_toroidal();
    }
    if &single != sharded {
        let differing = single
            .live_cells()
            .filter(|&(row, col)| !sharded.get(row, col))
            .count()
            + sharded
                .live_cells()
                .filter(|&(row, col)| !single.get(row, col))
                .count();
        bail!(
            "sharded board differs from the unsharded board in {} cells after {} generations",
            differing,
            generations
        );
    }
    Ok(())
}

/// Remembers the fingerprints of the last few boards.
struct CycleDetector {
    recent: VecDeque<u64>,
    window: usize,
}

impl CycleDetector {
    fn new(window: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Record a board. Returns the period if it was seen within the window.
    fn observe(&mut self, fingerprint: u64) -> Option<usize> {
        let period = self
            .recent
            .iter()
            .rev()
            .position(|&seen| seen == fingerprint)
            .map(|index| index + 1);
        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(fingerprint);
        period
    }
}

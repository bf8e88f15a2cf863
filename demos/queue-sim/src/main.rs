//! queue-sim — a single-server queue traced through the tables library.
//!
//! Customers arrive every `ARRIVAL_PERIOD` steps and are served every
//! `SERVICE_PERIOD` steps, so the queue slowly grows.  A time-series table
//! samples the live queue state each step through reference columns; a
//! results table summarizes the run at the end.
//!
//! Output lands in `./queue-sim-out/`:
//!   - `timeseries.csv`  (CsvTab: header + one row per step)
//!   - summary row on stdout (CsvRel)
//!
//! Build with `--features hdf5` to additionally mirror the time series
//! into `timeseries.h5`.

use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use anyhow::Result;

use tables::{open_sink, Column, GroupOps, ProgressBar, Table};

// ── Constants ─────────────────────────────────────────────────────────────────

const TOTAL_STEPS: u64 = 600;
const ARRIVAL_PERIOD: u64 = 3; // one arrival every 3 steps
const SERVICE_PERIOD: u64 = 4; // one departure every 4 steps
const OUT_DIR: &str = "queue-sim-out";

// ── Live simulation state, traced by reference columns ────────────────────────

#[derive(Clone)]
struct QueueState {
    step: Rc<Cell<u64>>,
    depth: Rc<Cell<u64>>,
    busy: Rc<Cell<bool>>,
}

impl QueueState {
    fn new() -> QueueState {
        QueueState {
            step: Rc::new(Cell::new(0)),
            depth: Rc::new(Cell::new(0)),
            busy: Rc::new(Cell::new(false)),
        }
    }

    fn advance(&self) -> (u64, u64) {
        let step = self.step.get() + 1;
        self.step.set(step);

        let mut arrivals = 0;
        let mut departures = 0;
        if step % ARRIVAL_PERIOD == 0 {
            self.depth.set(self.depth.get() + 1);
            arrivals = 1;
        }
        if step % SERVICE_PERIOD == 0 && self.depth.get() > 0 {
            self.depth.set(self.depth.get() - 1);
            departures = 1;
        }
        self.busy.set(self.depth.get() > 0);
        (arrivals, departures)
    }
}

fn main() -> Result<()> {
    fs::create_dir_all(OUT_DIR)?;
    let state = QueueState::new();

    // ── Time-series table, sampled every step ─────────────────────────────

    let clock = Rc::clone(&state.step);
    let series = Table::time_series("queue_depth", "%u", move || clock.get())?;
    series.add(&Column::reference("depth", "%u", &state.depth)?)?;
    series.add(&Column::reference("busy", "%d", &state.busy)?)?;

    let csv = open_sink(&format!("file:{OUT_DIR}/timeseries.csv?format=csvtab"))?;
    series.bind(&csv)?;

    #[cfg(feature = "hdf5")]
    {
        let h5 = open_sink(&format!("hdf5:{OUT_DIR}/timeseries.h5"))?;
        series.bind(&h5)?;
    }

    // ── Results table, emitted once at the end ────────────────────────────

    let summary = Table::results("queue_summary")?;
    let served = Column::new::<u64>("served", "%u")?;
    let arrived = Column::new::<u64>("arrived", "%u")?;
    let max_depth = Column::new::<u64>("max_depth", "%u")?;
    let mean_depth = Column::new::<f64>("mean_depth", "%.3f")?;
    summary.add_all(&[&served, &arrived, &max_depth, &mean_depth])?;
    summary.bind(&open_sink("stdout:")?)?;

    // ── Run ───────────────────────────────────────────────────────────────

    let mut bar = ProgressBar::stderr(40, "simulating: ");
    bar.start(TOTAL_STEPS)?;

    let mut total_arrived = 0u64;
    let mut total_served = 0u64;
    let mut peak = 0u64;
    let mut depth_sum = 0u64;

    series.prolog()?;
    for _ in 0..TOTAL_STEPS {
        let (arrivals, departures) = state.advance();
        total_arrived += arrivals;
        total_served += departures;
        peak = peak.max(state.depth.get());
        depth_sum += state.depth.get();

        series.emit_row()?;
        bar.tick(1)?;
    }
    series.epilog()?;
    bar.finish()?;

    served.set(total_served as f64)?;
    arrived.set(total_arrived as f64)?;
    max_depth.set(peak as f64)?;
    mean_depth.set(depth_sum as f64 / TOTAL_STEPS as f64)?;

    summary.prolog()?;
    summary.emit_row()?;
    summary.epilog()?;

    // Describe the time series for downstream tooling.
    let schema = fs::File::create(format!("{OUT_DIR}/timeseries.schema.json"))?;
    series.write_schema(&mut std::io::BufWriter::new(schema))?;

    eprintln!("wrote {OUT_DIR}/timeseries.csv ({TOTAL_STEPS} rows)");
    Ok(())
}

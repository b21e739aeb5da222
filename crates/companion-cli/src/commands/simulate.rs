//! Deterministic replay of a scripted scenario.
//!
//! The script is JSON lines, one step per line:
//!
//! ```text
//! {"at_ms": 0, "input": {"type": "event", "event": {"type": "task_completed"}}}
//! {"at_ms": 1000, "input": {"type": "pause"}}
//! {"at_ms": 30000}
//! ```
//!
//! `at_ms` is relative to `--start`. Steps must be in time order. Every
//! deadline between steps is honoured, and each view change is printed as
//! one JSON line.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Duration;
use clap::Args;
use companion_core::clock::epoch_ms;
use companion_core::{
    BubbleView, Clock, Companion, CompanionConfig, Input, ManualClock, MemoryStore, SqliteStore,
    Store,
};
use serde::{Deserialize, Serialize};

use super::hint::parse_now;

#[derive(Args)]
pub struct SimulateArgs {
    /// JSONL script of timed inputs
    script: PathBuf,
    /// RNG seed for line selection
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Start time (RFC 3339); defaults to now
    #[arg(long)]
    start: Option<String>,
    /// Keep running this long after the last step
    #[arg(long, default_value_t = 0)]
    tail_ms: u64,
    /// Use a SQLite file as the durable store instead of memory
    #[arg(long)]
    durable: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Step {
    at_ms: u64,
    #[serde(default)]
    input: Option<Input>,
}

#[derive(Debug, Serialize)]
struct Frame<'a> {
    at_ms: u64,
    view: &'a BubbleView,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&args.script)?;
    let steps = parse_script(&raw)?;

    let start = parse_now(args.start.as_deref())?;
    let clock = ManualClock::new(start);
    let durable: Arc<dyn Store> = match &args.durable {
        Some(path) => Arc::new(SqliteStore::open_at(path)?),
        None => Arc::new(MemoryStore::new()),
    };
    let mut companion = Companion::with_seed(
        CompanionConfig::load_or_default(),
        durable,
        Arc::new(MemoryStore::new()),
        Arc::new(clock.clone()),
        args.seed,
    );

    let mut sim = Simulation {
        clock,
        start_ms: epoch_ms(&start),
        last: companion.view(),
    };

    for step in steps {
        sim.run_until(&mut companion, step.at_ms)?;
        if let Some(input) = step.input {
            if let Some(action) = companion.apply(input) {
                eprintln!("action: {}", serde_json::to_string(&action)?);
            }
            sim.emit(&companion, step.at_ms)?;
        }
    }
    if args.tail_ms > 0 {
        let end = sim.elapsed_ms() + args.tail_ms;
        sim.run_until(&mut companion, end)?;
    }
    Ok(())
}

fn parse_script(raw: &str) -> Result<Vec<Step>, Box<dyn std::error::Error>> {
    let mut steps: Vec<Step> = Vec::new();
    for (n, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step: Step =
            serde_json::from_str(line).map_err(|e| format!("line {}: {e}", n + 1))?;
        if steps.last().is_some_and(|prev| prev.at_ms > step.at_ms) {
            return Err(format!("line {}: steps must be in time order", n + 1).into());
        }
        steps.push(step);
    }
    Ok(steps)
}

struct Simulation {
    clock: ManualClock,
    start_ms: u64,
    last: BubbleView,
}

impl Simulation {
    fn elapsed_ms(&self) -> u64 {
        epoch_ms(&self.clock.now()).saturating_sub(self.start_ms)
    }

    fn set_elapsed(&self, at_ms: u64) {
        let target = self.start_ms + at_ms;
        let now = epoch_ms(&self.clock.now());
        if target > now {
            self.clock.advance(Duration::milliseconds((target - now) as i64));
        }
    }

    /// Fire every deadline up to `at_ms`, then park the clock there.
    fn run_until(
        &mut self,
        companion: &mut Companion,
        at_ms: u64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let target = self.start_ms + at_ms;
        while let Some(deadline) = companion.next_deadline_ms() {
            if deadline > target {
                break;
            }
            let due = deadline.saturating_sub(self.start_ms);
            self.set_elapsed(due);
            if companion.tick() {
                self.emit(companion, due)?;
            }
        }
        self.set_elapsed(at_ms);
        Ok(())
    }

    fn emit(&mut self, companion: &Companion, at_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
        let view = companion.view();
        if view == self.last {
            return Ok(());
        }
        println!("{}", serde_json::to_string(&Frame { at_ms, view: &view })?);
        self.last = view;
        Ok(())
    }
}

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use companion_core::runtime::{self, CompanionHandle};
use companion_core::{
    Companion, CompanionConfig, CompanionError, Input, MemoryStore, SqliteStore, SystemClock,
};
use tracing::warn;

#[derive(Args)]
pub struct RunArgs {
    /// RNG seed for line selection; random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Keep running this long after stdin closes
    #[arg(long, default_value_t = 0)]
    linger_secs: u64,
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = CompanionConfig::load_or_default();
    let durable = Arc::new(SqliteStore::open()?);
    let tab = Arc::new(MemoryStore::new());
    let clock = Arc::new(SystemClock);
    let companion = match args.seed {
        Some(seed) => Companion::with_seed(config, durable, tab, clock, seed),
        None => Companion::new(config, durable, tab, clock),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let handle = runtime::spawn(companion);

        let mut views = handle.subscribe();
        let printer = tokio::spawn(async move {
            while views.changed().await.is_ok() {
                let line = serde_json::to_string(&*views.borrow_and_update())?;
                println!("{line}");
            }
            Ok::<_, serde_json::Error>(())
        });

        let reader = {
            let handle = handle.clone();
            tokio::task::spawn_blocking(move || read_inputs(&handle))
        };
        let read = reader.await?;

        if args.linger_secs > 0 {
            tokio::time::sleep(Duration::from_secs(args.linger_secs)).await;
        }
        handle.shutdown().await?;
        drop(handle);
        printer.await??;
        read?;
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

/// Forward stdin lines to the actor until EOF. Malformed lines are skipped.
fn read_inputs(handle: &CompanionHandle) -> Result<usize, CompanionError> {
    let stdin = std::io::stdin();
    let mut sent = 0;
    for (n, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Input>(line) {
            Ok(input) => {
                handle.send(input)?;
                sent += 1;
            }
            Err(e) => warn!(line = n + 1, error = %e, "skipping malformed input"),
        }
    }
    Ok(sent)
}

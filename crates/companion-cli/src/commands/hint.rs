use std::path::PathBuf;

use chrono::DateTime;
use clap::Args;
use companion_core::{evaluate_hint, HintContext, LocalTime};

#[derive(Args)]
pub struct HintArgs {
    /// JSON file with `courses`, `tasks`, `sessions` and `applications`
    context: PathBuf,
    /// Evaluate as of this RFC 3339 time instead of now
    #[arg(long)]
    now: Option<String>,
}

pub fn run(args: HintArgs) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(&args.context)?;
    let context: HintContext = serde_json::from_str(&raw)?;
    let now = parse_now(args.now.as_deref())?;

    if !context.is_ready() {
        eprintln!("context incomplete: every collection must be present");
    }
    match evaluate_hint(&context, &now) {
        Some(hint) => println!("{}", serde_json::to_string_pretty(&hint)?),
        None => println!("null"),
    }
    Ok(())
}

pub fn parse_now(value: Option<&str>) -> Result<LocalTime, Box<dyn std::error::Error>> {
    match value {
        Some(s) => Ok(DateTime::parse_from_rfc3339(s)?),
        None => Ok(chrono::Local::now().fixed_offset()),
    }
}

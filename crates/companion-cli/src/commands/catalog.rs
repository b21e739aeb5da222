use clap::Args;
use companion_core::{Catalog, Mood};

#[derive(Args)]
pub struct CatalogArgs {
    /// Only lines of this mood (motivate, celebrate, warning, recovery, idle)
    #[arg(long)]
    mood: Option<Mood>,
    /// Include the break-invite lines
    #[arg(long)]
    break_invites: bool,
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: CatalogArgs) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::builtin();
    let mut lines: Vec<_> = catalog
        .lines()
        .iter()
        .filter(|l| args.mood.map_or(true, |m| l.mood == m))
        .collect();
    if args.break_invites {
        lines.extend(catalog.break_invites());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    for line in lines {
        println!("{:<10} {:<10} {}", line.id, line.mood.as_str(), line.template);
    }
    Ok(())
}

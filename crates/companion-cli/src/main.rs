use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "companion", version, about = "Companion bubble scheduler CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the message catalog
    Catalog(commands::catalog::CatalogArgs),
    /// Evaluate the contextual hint engine over a JSON context file
    Hint(commands::hint::HintArgs),
    /// Mute flags and cooldown in the durable store
    Gate {
        #[command(subcommand)]
        action: commands::gate::GateAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Replay a scripted scenario against a manual clock
    Simulate(commands::simulate::SimulateArgs),
    /// Run the live companion, reading JSON inputs from stdin
    Run(commands::run::RunArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Catalog(args) => commands::catalog::run(args),
        Commands::Hint(args) => commands::hint::run(args),
        Commands::Gate { action } => commands::gate::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Run(args) => commands::run::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

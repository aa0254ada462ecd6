use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod channels;
mod commands;

#[derive(Parser)]
#[command(name = "haptic-timer", version, about = "Haptic countdown timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a countdown in the terminal
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Feedback interval toggles
    Intervals {
        #[command(subcommand)]
        action: commands::intervals::IntervalsAction,
    },
    /// Show feedback tiers and the notification fallback for a remaining time
    Plan(commands::plan::PlanArgs),
    /// Write the tick sound files
    Sounds(commands::sounds::SoundsArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HAPTIC_TIMER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Intervals { action } => commands::intervals::run(action),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Sounds(args) => commands::sounds::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

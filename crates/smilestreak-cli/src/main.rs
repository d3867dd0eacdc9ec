use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "smilestreak", version, about = "SmileStreak CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and streak statistics
    Stats {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Session and challenge recording
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Reset all score data to defaults
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
    /// Inspect or delete the raw stored record
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Replay a frame script through the smile detector pipeline
    Simulate(commands::simulate::SimulateArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Stats { json } => commands::stats::run(json),
        Commands::Session { action } => commands::session::run(action),
        Commands::Reset { yes } => commands::reset::run(yes),
        Commands::Data { action } => commands::data::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Simulate(args) => commands::simulate::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

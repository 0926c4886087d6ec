//! goldencheck CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

/// Exit status for input errors (unreadable suite, responses, or config).
const EXIT_INPUT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(name = "goldencheck", version, about = "Golden prompt rubric scorer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score responses against a golden suite
    Run(commands::run::RunArgs),

    /// Lint a suite file
    Validate {
        /// Path to the .json or .toml suite
        #[arg(long)]
        suite: PathBuf,
    },

    /// Create starter config and example suite
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("goldencheck=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args).await,
        Commands::Validate { suite } => commands::validate::execute(suite),
        Commands::Init => commands::init::execute(),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(EXIT_INPUT_ERROR);
        }
    }
}

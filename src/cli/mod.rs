//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod locate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Resolve where this machine is
#[derive(Parser)]
#[command(name = "geolocator")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log pipeline steps to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the current location
    Locate(locate::LocateArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Install the stderr log subscriber
///
/// `RUST_LOG` wins when set; otherwise `warn`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let fallback = if verbose { "geolocator=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Locate(args) => locate::run(args).await,
        Commands::Config(args) => config::run(args),
    }
}

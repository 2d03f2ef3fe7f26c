//! Sonance CLI - spectral analysis, low-rank resynthesis, and modulation
//! amplification of WAV files.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sonance")]
#[command(author, version, about = "Sonance spectral analysis CLI", long_about = None)]
struct Cli {
    /// Log debug detail (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: user config, if present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resynthesize a clip unmodified and rank-truncated
    Resynth(commands::resynth::ResynthArgs),

    /// Analyze a clip and save its SVD model
    Decompose(commands::decompose::DecomposeArgs),

    /// Rebuild audio from a saved model and a keep-set
    Reconstruct(commands::reconstruct::ReconstructArgs),

    /// Flatten the spectral envelope of a clip
    Whiten(commands::whiten::WhitenArgs),

    /// Amplify slow amplitude modulation in a frequency passband
    Amplify(commands::amplify::AmplifyArgs),

    /// Generate a test sine
    Generate(commands::generate::GenerateArgs),

    /// Show WAV metadata and framing
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Resynth(args) => commands::resynth::run(args, config),
        Commands::Decompose(args) => commands::decompose::run(args, config),
        Commands::Reconstruct(args) => commands::reconstruct::run(args, config),
        Commands::Whiten(args) => commands::whiten::run(args, config),
        Commands::Amplify(args) => commands::amplify::run(args, config),
        Commands::Generate(args) => commands::generate::run(args),
        Commands::Info(args) => commands::info::run(args, config),
    }
}

//! # vp-cli
//!
//! Command-line interface for the verification-policy compiler.
//!
//! - `vp convert` — compile a governance policy (YAML or JSON) into an
//!   attestation verification policy, optionally merging with a stored
//!   copy so hand-edited tenet code survives regeneration.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Verification policy compiler.
#[derive(Parser)]
#[command(name = "vp", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a governance policy into a verification policy.
    Convert(commands::convert::ConvertArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is reserved for policy output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Convert(args) => commands::convert::execute(args),
    }
}

//! Malaga CLI binary.
//!
//! Trains a scorer on per-instrument feature files, simulates the daily
//! top-K equal-weight portfolio and reports the final picks.

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "malaga")]
#[command(about = "Daily top-K ranking and portfolio simulation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, simulate and report
    Run(cmd::run::RunArgs),

    /// List built-in universes
    Universes {
        /// Also list every ticker
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the default configuration as JSON
    Config,
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Run(args) if args.verbose);
    init_tracing(verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Logs go to stderr, filtered by `RUST_LOG`. `--verbose` raises the default
/// level to debug.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => cmd::run::run(&args),
        Commands::Universes { verbose } => {
            cmd::universes::list_universes(verbose);
            Ok(())
        }
        Commands::Config => cmd::config::print_default_config(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_universes() {
        let cli = Cli::try_parse_from(["malaga", "universes", "--verbose"]).unwrap();
        assert!(matches!(cli.command, Commands::Universes { verbose: true }));
    }

    #[test]
    fn test_run_requires_prices() {
        assert!(Cli::try_parse_from(["malaga", "run"]).is_err());
        assert!(Cli::try_parse_from(["malaga", "run", "--prices", "data/prices"]).is_ok());
    }
}

//! HireHub CLI binary entrypoint.
//!
//! This is the main entry point for the `hirehub` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hire_cli::cli::{Cli, Commands};
use hire_cli::commands::{ReplayCommand, RunCommand};
use hire_cli::output::OutputFormat;
use hire_market::MarketConfig;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), hire_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Run { scenario } => {
            let config = match &cli.config {
                Some(path) => MarketConfig::load(path)?,
                None => MarketConfig::default(),
            };
            RunCommand::new(config).execute(&mut stdout, &format, &scenario)?;
        }
        Commands::Replay { events } => {
            ReplayCommand::new().execute(&mut stdout, &format, &events)?;
        }
    }

    Ok(())
}

//! # spd
//!
//! Command-line entry point of the sensor position dataset helper.
//!
//! Command output goes to stdout, logs to stderr.

mod cli;
mod commands;
mod error;
mod settings;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use observability::ObservabilityConfig;
use tracing::{debug, error};

use cli::{Cli, Commands};
use commands::{run_events, run_info, run_labels, run_load, run_subjects, run_validate, run_verify};
use settings::Settings;

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{e:#}");
        return ExitCode::FAILURE;
    }

    debug!(version = env!("CARGO_PKG_VERSION"), "spd starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(error::exit_code(&e))
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Subjects(args) => run_subjects(&Settings::from_cli(cli)?, args),
        Commands::Info(args) => run_info(&Settings::from_cli(cli)?, args),
        Commands::Labels(args) => run_labels(&Settings::from_cli(cli)?, args),
        Commands::Events(args) => run_events(&Settings::from_cli(cli)?, args),
        Commands::Load(args) => run_load(&Settings::from_cli(cli)?, args),
        Commands::Verify(args) => run_verify(&Settings::from_cli(cli)?, args),
        Commands::Validate(args) => run_validate(cli.config.as_deref(), args),
    }
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let default_log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: cli.metrics_port,
        default_log_level: default_log_level.to_string(),
    })
}

//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::TestName;
use std::path::PathBuf;

/// spd - sensor position dataset helper
#[derive(Parser, Debug)]
#[command(
    name = "spd",
    author,
    version,
    about = "Query, load and verify the sensor position dataset",
    long_about = "Lists subjects and trials of the sensor position dataset, loads a trial as \n\
                  calibrated, time-aligned IMU and motion-capture tables, and verifies that \n\
                  the dataset folder is at the revision an analysis expects."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SPD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all logs except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "SPD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true, env = "SPD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dataset root; overrides `data_folder` from the configuration
    #[arg(short, long, global = true, env = "SPD_DATA_FOLDER")]
    pub data_folder: Option<PathBuf>,

    /// Serve Prometheus metrics on this port while the command runs
    #[arg(long, global = true, env = "SPD_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the subjects of the dataset
    Subjects(SubjectsArgs),

    /// Show the metadata of one subject
    Info(InfoArgs),

    /// Show the manual stride labels of a subject or one of its tests
    Labels(LabelsArgs),

    /// Show the mocap gait events of one trial
    Events(EventsArgs),

    /// Load one trial
    Load(LoadArgs),

    /// Check the dataset folder against a revision
    Verify(VerifyArgs),

    /// Validate the configuration file
    Validate(ValidateArgs),
}

/// Arguments for the `subjects` command
#[derive(Args, Debug)]
pub struct SubjectsArgs {
    /// Also list subjects excluded by the configuration
    #[arg(long)]
    pub all: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Subject id, e.g. 54a9
    pub subject: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `labels` command
#[derive(Args, Debug)]
pub struct LabelsArgs {
    /// Subject id
    pub subject: String,

    /// Only strides inside this test, counted from its start
    pub test: Option<TestName>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `events` command
#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Subject id
    pub subject: String,

    /// Test name
    pub test: TestName,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `load` command
#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Subject id
    pub subject: String,

    /// Test name, e.g. slow_10
    pub test: TestName,

    /// Override the configured padding (seconds)
    #[arg(long)]
    pub padding: Option<f64>,

    /// Keep sensor frames instead of rotating into the foot frame
    #[arg(long)]
    pub no_align: bool,

    /// Print the whole trial as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `verify` command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Expected revision; defaults to `expected_revision` from the configuration
    #[arg(long)]
    pub revision: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

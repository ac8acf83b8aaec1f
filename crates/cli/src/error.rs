//! Error types and exit codes for CLI operations.

use std::path::PathBuf;

use contracts::DatasetError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file failed to parse or validate
    #[error("Configuration is invalid: {}", path.display())]
    InvalidConfig { path: PathBuf },

    /// `validate` without `--config`
    #[error("No configuration file given: pass --config or set SPD_CONFIG")]
    MissingConfig,

    /// `verify` without `--revision` and without `expected_revision`
    #[error("No revision to verify against: pass --revision or set expected_revision")]
    NoRevision,
}

impl CliError {
    pub fn invalid_config(path: impl Into<PathBuf>) -> Self {
        Self::InvalidConfig { path: path.into() }
    }
}

/// Process exit code for a failed command
///
/// - 2: something does not exist
/// - 3: a dataset file is malformed
/// - 4: the dataset is not at the expected revision
/// - 5: configuration problem
/// - 1: anything else
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(cli) = error.downcast_ref::<CliError>() {
        return match cli {
            CliError::InvalidConfig { .. } | CliError::MissingConfig | CliError::NoRevision => 5,
        };
    }

    let Some(dataset) = error.chain().find_map(|e| e.downcast_ref::<DatasetError>()) else {
        return 1;
    };
    match dataset.kind() {
        "not_found" | "calibration_not_found" => 2,
        "corrupt_recording" | "calibration_format" | "metadata_format" => 3,
        "revision_mismatch" | "dirty_repository" | "not_a_versioned_folder"
        | "unknown_revision" => 4,
        "config_parse" | "config_validation" => 5,
        _ => 1,
    }
}

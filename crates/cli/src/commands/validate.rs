//! `validate` command implementation.

use std::path::Path;

use anyhow::Result;
use config_loader::{ConfigLoader, DatasetConfig};
use serde::Serialize;
use tracing::info;

use super::print_json;
use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<DatasetConfig>,
}

/// Execute the `validate` command against `--config`
pub fn run_validate(config_path: Option<&Path>, args: &ValidateArgs) -> Result<()> {
    let path = config_path.ok_or(CliError::MissingConfig)?;
    info!(config = %path.display(), "Validating configuration");

    let result = validate_config(path);
    if args.json {
        print_json(&result)?;
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::invalid_config(path).into())
    }
}

fn validate_config(path: &Path) -> ValidationResult {
    let config_path = path.display().to_string();
    match ConfigLoader::load_from_path(path) {
        Ok(config) => ValidationResult {
            valid: true,
            config_path,
            error: None,
            warnings: collect_warnings(&config),
            config: Some(config),
        },
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            config: None,
        },
    }
}

/// Non-fatal issues
fn collect_warnings(config: &DatasetConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    match &config.data_folder {
        None => warnings.push("data_folder is not set - every command needs --data-folder".into()),
        Some(folder) if !folder.is_dir() => {
            warnings.push(format!("data_folder {} does not exist", folder.display()))
        }
        Some(_) => {}
    }

    if config.expected_revision.is_none() {
        warnings.push("expected_revision is not set - `spd verify` needs --revision".into());
    }

    if config.include_wrong_recording && !config.excluded_subjects.is_empty() {
        warnings.push("include_wrong_recording is set - excluded_subjects has no effect".into());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(config) = &result.config {
            if let Some(folder) = &config.data_folder {
                println!("\n  Data folder: {}", folder.display());
            }
            if let Some(revision) = &config.expected_revision {
                println!("  Expected revision: {revision}");
            }
            println!("  Padding: {} s", config.load.padding_s);
            println!("  Foot-frame alignment: {}", config.load.align_coordinates);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(error) = &result.error {
            println!("\n  Error: {error}");
        }
    }
}

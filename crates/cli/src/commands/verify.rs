//! `verify` command implementation.

use anyhow::{Context, Result};
use contracts::DatasetRevision;
use revision_guard::{current_revision, ensure_revision, GitCli};
use serde::Serialize;

use super::print_json;
use crate::cli::VerifyArgs;
use crate::error::CliError;
use crate::settings::Settings;

#[derive(Serialize)]
struct VerifyResult<'a> {
    folder: String,
    expected: &'a str,
    current: DatasetRevision,
}

/// Execute the `verify` command
///
/// Without a revision to check against this still fails, so scripts cannot mistake a
/// missing setting for a verified dataset.
pub fn run_verify(settings: &Settings, args: &VerifyArgs) -> Result<()> {
    let expected = args
        .revision
        .as_deref()
        .or(settings.config.expected_revision.as_deref())
        .ok_or(CliError::NoRevision)?;

    let folder = settings
        .config
        .resolve_data_folder(settings.data_folder())
        .context("Failed to resolve the dataset folder")?;

    let git = GitCli::default();
    ensure_revision(&git, &folder, expected)
        .with_context(|| format!("Dataset at {} failed verification", folder.display()))?;
    let current = current_revision(&git, &folder)?;

    let result = VerifyResult {
        folder: folder.display().to_string(),
        expected,
        current,
    };
    if args.json {
        print_json(&result)
    } else {
        println!("✓ {} is at {} ({})", result.folder, result.expected, result.current);
        Ok(())
    }
}

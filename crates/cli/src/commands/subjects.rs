//! `subjects` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use super::print_json;
use crate::cli::SubjectsArgs;
use crate::settings::Settings;

/// Execute the `subjects` command
pub fn run_subjects(settings: &Settings, args: &SubjectsArgs) -> Result<()> {
    let mut config = settings.config.clone();
    if args.all {
        config.include_wrong_recording = true;
    }

    let subjects = catalog::list_subjects(&config, settings.data_folder())
        .context("Failed to list subjects")?;
    info!(count = subjects.len(), "subjects listed");

    if args.json {
        return print_json(&subjects);
    }
    for subject in &subjects {
        println!("{subject}");
    }
    Ok(())
}

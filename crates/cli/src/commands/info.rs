//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SubjectMetadata;

use super::print_json;
use crate::cli::InfoArgs;
use crate::settings::Settings;

/// Execute the `info` command
pub fn run_info(settings: &Settings, args: &InfoArgs) -> Result<()> {
    let metadata =
        catalog::read_subject_metadata(&settings.config, &args.subject, settings.data_folder())
            .with_context(|| format!("Failed to read metadata of subject '{}'", args.subject))?;

    if args.json {
        print_json(&metadata)
    } else {
        print_metadata(&metadata);
        Ok(())
    }
}

fn print_metadata(metadata: &SubjectMetadata) {
    println!("Subject: {}", metadata.subject);

    println!("\nSensors:");
    for (position, hardware_id) in &metadata.sensors {
        println!("  {position:<12} {hardware_id}");
    }

    println!("\nTests:");
    for test in metadata.tests() {
        print!("  {test}");
        if let Some(duration) = metadata.trial(test).and_then(|t| t.duration_s) {
            print!(" ({duration:.1} s)");
        }
        println!();
    }
}

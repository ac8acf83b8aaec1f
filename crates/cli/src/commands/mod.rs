//! Command implementations.

mod info;
mod labels;
mod load;
mod subjects;
mod validate;
mod verify;

pub use info::run_info;
pub use labels::{run_events, run_labels};
pub use load::run_load;
pub use subjects::run_subjects;
pub use validate::run_validate;
pub use verify::run_verify;

use anyhow::{Context, Result};
use serde::Serialize;

/// Pretty JSON on stdout
fn print_json(value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

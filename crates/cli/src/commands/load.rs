//! `load` command implementation.

use anyhow::{Context, Result};
use contracts::{SynchronizedTrialData, QuirkReport};
use serde::Serialize;
use sync_engine::TrialLoader;

use super::print_json;
use crate::cli::LoadArgs;
use crate::settings::Settings;

/// Execute the `load` command
pub fn run_load(settings: &Settings, args: &LoadArgs) -> Result<()> {
    let mut config = settings.config.clone();
    if let Some(padding) = args.padding {
        anyhow::ensure!(
            padding.is_finite() && padding >= 0.0,
            "--padding must be a non-negative number of seconds"
        );
        config.load.padding_s = padding;
    }
    if args.no_align {
        config.load.align_coordinates = false;
    }

    let trial = TrialLoader::new(config)
        .load_trial(&args.subject, args.test, settings.data_folder())
        .with_context(|| format!("Failed to load trial {}/{}", args.subject, args.test))?;

    if args.json {
        print_json(&trial)
    } else {
        let summary = TrialSummary::from(&trial);
        print_summary(&summary);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TrialSummary {
    subject: String,
    test: String,
    origin: String,
    imu_rate_hz: f64,
    imu_rows: usize,
    sensors: Vec<String>,
    mocap_rate_hz: f64,
    mocap_frames: usize,
    markers: Vec<String>,
    start_s: Option<f64>,
    end_s: Option<f64>,
    quirks: QuirkReport,
    warnings: Vec<String>,
}

impl From<&SynchronizedTrialData> for TrialSummary {
    fn from(trial: &SynchronizedTrialData) -> Self {
        Self {
            subject: trial.subject.to_string(),
            test: trial.test.to_string(),
            origin: format!("{:?}", trial.alignment.origin),
            imu_rate_hz: trial.imu.sampling_rate_hz,
            imu_rows: trial.imu.len(),
            sensors: trial.imu.sensors.keys().cloned().collect(),
            mocap_rate_hz: trial.mocap.sampling_rate_hz,
            mocap_frames: trial.mocap.len(),
            markers: trial.mocap.markers.keys().cloned().collect(),
            start_s: trial.imu.time_s.first().copied(),
            end_s: trial.imu.time_s.last().copied(),
            quirks: trial.alignment.quirks,
            warnings: trial.alignment.warnings.clone(),
        }
    }
}

fn print_summary(summary: &TrialSummary) {
    println!("Trial: {}/{}", summary.subject, summary.test);
    println!("  Origin: {}", summary.origin);
    println!(
        "  IMU:   {} rows at {:.1} Hz, sensors: {}",
        summary.imu_rows,
        summary.imu_rate_hz,
        summary.sensors.join(", ")
    );
    println!(
        "  Mocap: {} frames at {:.1} Hz, {} markers",
        summary.mocap_frames,
        summary.mocap_rate_hz,
        summary.markers.len()
    );
    if let (Some(start), Some(end)) = (summary.start_s, summary.end_s) {
        println!("  Time:  {start:.3} s .. {end:.3} s");
    }
    if !summary.quirks.is_clean() {
        println!("  Firmware quirks: {}", summary.quirks.total());
    }
    for warning in &summary.warnings {
        println!("  ⚠ {warning}");
    }
}

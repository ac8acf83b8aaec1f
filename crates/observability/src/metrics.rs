//! Dataset loading metrics
//!
//! Thin wrappers over the `metrics` facade so metric names and labels stay in one place.
//! Without an installed recorder every call is a no-op.

use contracts::{OriginSource, QuirkReport};
use metrics::{counter, histogram};

/// Firmware quirk kinds reported by the IMU readers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuirkKind {
    Duplicate,
    OutOfOrder,
}

impl QuirkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuirkKind::Duplicate => "duplicate",
            QuirkKind::OutOfOrder => "out_of_order",
        }
    }
}

/// Record samples dropped while decoding one sensor
pub fn record_imu_quirks(sensor_id: &str, report: &QuirkReport) {
    for (kind, count) in [
        (QuirkKind::Duplicate, report.duplicates),
        (QuirkKind::OutOfOrder, report.out_of_order),
    ] {
        if count > 0 {
            counter!(
                "spd_imu_quirks_total",
                "sensor_id" => sensor_id.to_string(),
                "kind" => kind.as_str()
            )
            .increment(u64::from(count));
        }
    }
}

/// Record a trial whose origin fell back to the first samples
pub fn record_alignment_fallback(subject: &str, test: &str) {
    counter!(
        "spd_alignment_fallback_total",
        "subject" => subject.to_string(),
        "test" => test.to_string()
    )
    .increment(1);
}

/// Record a successfully loaded trial
pub fn record_trial_loaded(test: &str, origin: OriginSource, duration_ms: f64) {
    let origin = match origin {
        OriginSource::Metadata => "metadata",
        OriginSource::DetectedTrigger => "detected_trigger",
        OriginSource::FirstSampleFallback => "first_sample_fallback",
    };
    counter!("spd_trials_loaded_total", "test" => test.to_string(), "origin" => origin)
        .increment(1);
    histogram!("spd_load_duration_ms").record(duration_ms);
}

/// Record a failed trial load
pub fn record_trial_failed(test: &str, error_kind: &'static str) {
    counter!(
        "spd_trials_failed_total",
        "test" => test.to_string(),
        "error" => error_kind
    )
    .increment(1);
}

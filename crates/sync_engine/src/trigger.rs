//! Trigger detection
//!
//! Both acquisition systems recorded the same synchronization event. A detector locates it
//! in one stream at a time; the loader combines the two results into the common origin.

use contracts::{OriginSource, TriggerConfig};
use tracing::debug;

/// Mocap analog channel labels carrying the trigger
pub const TRIGGER_CHANNELS: [&str; 2] = ["sync", "trigger"];

/// Everything a detector may look at for one stream
#[derive(Debug, Clone, Copy)]
pub struct TriggerSignal<'a> {
    /// `"imu"` or `"mocap"`, for logs
    pub stream: &'static str,
    /// Rows of the stream (IMU samples or mocap frames)
    pub len: usize,
    /// Explicit row from the trial metadata
    pub hint: Option<usize>,
    /// Trigger channel, `samples_per_row` values per row
    pub samples: Option<&'a [f64]>,
    pub samples_per_row: usize,
    /// Rate of `samples`
    pub sample_rate_hz: f64,
}

/// Located trigger row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub row: usize,
    pub source: OriginSource,
}

/// Locates the trigger in one stream
pub trait TriggerDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn locate(&self, signal: &TriggerSignal<'_>) -> Option<Detection>;
}

/// Rows given explicitly in the trial metadata
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataHint;

impl TriggerDetector for MetadataHint {
    fn name(&self) -> &'static str {
        "metadata_hint"
    }

    fn locate(&self, signal: &TriggerSignal<'_>) -> Option<Detection> {
        let row = signal.hint?;
        if row >= signal.len {
            debug!(stream = signal.stream, row, len = signal.len, "sync hint outside the recording");
            return None;
        }
        Some(Detection {
            row,
            source: OriginSource::Metadata,
        })
    }
}

/// First rising edge of the normalized trigger channel that stays high
#[derive(Debug, Clone)]
pub struct RisingEdge {
    config: TriggerConfig,
}

impl RisingEdge {
    pub fn new(config: TriggerConfig) -> Self {
        Self { config }
    }

    /// Index into `samples` of the first qualifying edge
    pub fn find_edge(&self, samples: &[f64], sample_rate_hz: f64) -> Option<usize> {
        let (lo, hi) = samples
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(*v), hi.max(*v))
            });
        let span = hi - lo;
        if !span.is_finite() || span <= f64::EPSILON {
            return None;
        }

        // NaN compares false, so gaps count as low
        let high = |v: f64| (v - lo) / span >= self.config.threshold;
        let start = ((self.config.ignore_initial_s * sample_rate_hz).ceil() as usize).max(1);
        let hold = self.config.min_high_samples.max(1);

        (start..samples.len()).find(|&i| {
            !high(samples[i - 1])
                && i + hold <= samples.len()
                && samples[i..i + hold].iter().all(|v| high(*v))
        })
    }
}

impl TriggerDetector for RisingEdge {
    fn name(&self) -> &'static str {
        "rising_edge"
    }

    fn locate(&self, signal: &TriggerSignal<'_>) -> Option<Detection> {
        let samples = signal.samples?;
        let edge = self.find_edge(samples, signal.sample_rate_hz)?;
        let row = edge / signal.samples_per_row.max(1);
        if row >= signal.len {
            return None;
        }
        debug!(stream = signal.stream, edge, row, "trigger edge found");
        Some(Detection {
            row,
            source: OriginSource::DetectedTrigger,
        })
    }
}

/// Detectors tried in order; the first hit wins
pub struct DetectorChain {
    detectors: Vec<Box<dyn TriggerDetector>>,
}

impl DetectorChain {
    pub fn new(detectors: Vec<Box<dyn TriggerDetector>>) -> Self {
        Self { detectors }
    }

    /// Metadata hints, then the rising edge
    pub fn standard(config: &TriggerConfig) -> Self {
        Self::new(vec![
            Box::new(MetadataHint),
            Box::new(RisingEdge::new(config.clone())),
        ])
    }
}

impl TriggerDetector for DetectorChain {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn locate(&self, signal: &TriggerSignal<'_>) -> Option<Detection> {
        self.detectors.iter().find_map(|d| {
            let hit = d.locate(signal);
            if hit.is_some() {
                debug!(stream = signal.stream, detector = d.name(), "trigger located");
            }
            hit
        })
    }
}

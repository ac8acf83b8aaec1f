//! Per-sensor sample accumulation with firmware quirk repair

use contracts::{QuirkReport, RawImuSensor, Vector3};
use tracing::warn;

/// Decoded values of one sample
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sample {
    pub counter: u32,
    pub acc: Vector3,
    pub gyr: Vector3,
    pub mag: Option<Vector3>,
    pub sync: Option<f64>,
}

/// Collects samples of one sensor, dropping repeated and decreasing counters
///
/// The newest sample is held back until its successor arrives. A held sample whose
/// counter jumps past its successor while the successor still advances on the kept
/// series is an isolated spike and is dropped instead of the samples that follow it.
pub(crate) struct SensorSamples {
    sensor_id: String,
    sampling_rate_hz: f64,
    pending: Option<Sample>,
    counter: Vec<u32>,
    acc: Vec<Vector3>,
    gyr: Vec<Vector3>,
    mag: Option<Vec<Vector3>>,
    sync: Option<Vec<f64>>,
    quirks: QuirkReport,
}

impl SensorSamples {
    pub fn new(
        sensor_id: impl Into<String>,
        sampling_rate_hz: f64,
        has_mag: bool,
        has_sync: bool,
        capacity: usize,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sampling_rate_hz,
            pending: None,
            counter: Vec::with_capacity(capacity),
            acc: Vec::with_capacity(capacity),
            gyr: Vec::with_capacity(capacity),
            mag: has_mag.then(|| Vec::with_capacity(capacity)),
            sync: has_sync.then(|| Vec::with_capacity(capacity)),
            quirks: QuirkReport::default(),
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn has_mag(&self) -> bool {
        self.mag.is_some()
    }

    pub fn has_sync(&self) -> bool {
        self.sync.is_some()
    }

    /// Append a sample unless its counter does not advance
    pub fn push(&mut self, sample: Sample) {
        let Some(pending) = self.pending else {
            self.pending = Some(sample);
            return;
        };

        if sample.counter == pending.counter {
            self.quirks.duplicates += 1;
            return;
        }
        if sample.counter < pending.counter {
            let advances = self.counter.last().map_or(true, |&last| sample.counter > last);
            self.quirks.out_of_order += 1;
            if advances {
                self.pending = Some(sample);
            }
            return;
        }

        self.commit(pending);
        self.pending = Some(sample);
    }

    fn commit(&mut self, sample: Sample) {
        self.counter.push(sample.counter);
        self.acc.push(sample.acc);
        self.gyr.push(sample.gyr);
        if let Some(mag) = &mut self.mag {
            mag.push(sample.mag.unwrap_or(Vector3::NAN));
        }
        if let Some(sync) = &mut self.sync {
            sync.push(sample.sync.unwrap_or(f64::NAN));
        }
    }

    /// Finish the sensor, reporting repaired quirks
    pub fn finish(mut self) -> RawImuSensor {
        if let Some(pending) = self.pending.take() {
            self.commit(pending);
        }
        if !self.quirks.is_clean() {
            warn!(
                sensor_id = %self.sensor_id,
                duplicates = self.quirks.duplicates,
                out_of_order = self.quirks.out_of_order,
                kept = self.counter.len(),
                "dropped samples with repeated or decreasing counters"
            );
            observability::record_imu_quirks(&self.sensor_id, &self.quirks);
        }

        RawImuSensor {
            sensor_id: self.sensor_id,
            sampling_rate_hz: self.sampling_rate_hz,
            counter: self.counter,
            acc: self.acc,
            gyr: self.gyr,
            mag: self.mag,
            sync: self.sync,
            quirks: self.quirks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(counter: u32) -> Sample {
        Sample {
            counter,
            acc: Vector3::new(counter as f64, 0.0, 0.0),
            gyr: Vector3::default(),
            mag: None,
            sync: Some(0.0),
        }
    }

    #[test]
    fn test_quirks_dropped_and_counted() {
        let mut samples = SensorSamples::new("9e82", 204.8, false, true, 8);
        for c in [0, 1, 1, 2, 1, 3, 3, 4] {
            samples.push(sample(c));
        }
        let sensor = samples.finish();
        assert_eq!(sensor.counter, [0, 1, 2, 3, 4]);
        assert_eq!(sensor.acc[3].x, 3.0);
        assert_eq!(sensor.quirks.duplicates, 2);
        assert_eq!(sensor.quirks.out_of_order, 1);
        assert_eq!(sensor.sync.as_ref().map(Vec::len), Some(5));
        assert!(sensor.mag.is_none());
    }

    #[test]
    fn test_gaps_are_kept() {
        let mut samples = SensorSamples::new("9e82", 100.0, false, false, 3);
        for c in [10, 12, 15] {
            samples.push(sample(c));
        }
        let sensor = samples.finish();
        assert_eq!(sensor.counter, [10, 12, 15]);
        assert!(sensor.quirks.is_clean());
    }

    #[test]
    fn test_forward_spike_dropped_alone() {
        let mut samples = SensorSamples::new("9e82", 204.8, false, true, 301);
        for c in (0..100).chain([1000]).chain(100..300) {
            samples.push(sample(c));
        }
        let sensor = samples.finish();
        assert_eq!(sensor.counter.len(), 300);
        assert_eq!(sensor.counter, (0..300).collect::<Vec<u32>>());
        assert_eq!(sensor.quirks.out_of_order, 1);
        assert_eq!(sensor.quirks.duplicates, 0);
    }

    #[test]
    fn test_leading_spike_dropped() {
        let mut samples = SensorSamples::new("9e82", 100.0, false, false, 4);
        for c in [u32::MAX - 1, 0, 1, 2] {
            samples.push(sample(c));
        }
        let sensor = samples.finish();
        assert_eq!(sensor.counter, [0, 1, 2]);
        assert_eq!(sensor.quirks.out_of_order, 1);
    }
}

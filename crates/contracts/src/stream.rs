//! Raw streams - Raw Stream Reader output
//!
//! Decoded but uncalibrated recordings, at their native sample rates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::HardwareId;

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const NAN: Vector3 = Vector3 {
        x: f64::NAN,
        y: f64::NAN,
        z: f64::NAN,
    };

    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3 {
    #[inline]
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Recording format revision of an IMU file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImuFormatRevision {
    /// Binary v1: rate stored as a divider of 1024 Hz, fixed ranges, CRC-16 header
    LegacyBinary,
    /// Binary v2: rate stored as f32, per-sensor ranges, CRC-32 header
    Binary,
    /// Text export with physical units
    Csv,
}

/// Firmware quirks that were repaired while decoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuirkReport {
    /// Samples dropped because their counter repeated the previous one
    pub duplicates: u32,
    /// Samples dropped because their counter went backwards
    pub out_of_order: u32,
}

impl QuirkReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0
    }

    pub fn total(&self) -> u32 {
        self.duplicates + self.out_of_order
    }

    pub fn merge(&mut self, other: QuirkReport) {
        self.duplicates += other.duplicates;
        self.out_of_order += other.out_of_order;
    }
}

/// Samples of one sensor unit
#[derive(Debug, Clone, PartialEq)]
pub struct RawImuSensor {
    /// Lower-cased hardware id
    pub sensor_id: HardwareId,

    /// Native sample rate from the recording header (Hz)
    pub sampling_rate_hz: f64,

    /// Strictly increasing sample counters
    pub counter: Vec<u32>,

    /// Accelerometer (m/s²)
    pub acc: Vec<Vector3>,

    /// Gyroscope (deg/s)
    pub gyr: Vec<Vector3>,

    /// Magnetometer (µT), when the unit recorded one
    pub mag: Option<Vec<Vector3>>,

    /// Sync/trigger analog channel normalized to 0..1, when the unit recorded one
    pub sync: Option<Vec<f64>>,

    /// Repairs applied to this sensor's samples
    pub quirks: QuirkReport,
}

impl RawImuSensor {
    pub fn len(&self) -> usize {
        self.counter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counter.is_empty()
    }
}

/// Decoded IMU recording
#[derive(Debug, Clone, PartialEq)]
pub struct RawImuStream {
    pub source: PathBuf,
    pub format: ImuFormatRevision,
    /// Recording start, UTC milliseconds since epoch
    pub start_unix_ms: Option<i64>,
    pub sensors: Vec<RawImuSensor>,
}

impl RawImuStream {
    /// Sensor by hardware id, case-insensitive
    pub fn sensor(&self, sensor_id: &str) -> Option<&RawImuSensor> {
        self.sensors
            .iter()
            .find(|s| s.sensor_id.eq_ignore_ascii_case(sensor_id))
    }

    /// Quirks over all sensors
    pub fn quirks(&self) -> QuirkReport {
        let mut total = QuirkReport::default();
        for sensor in &self.sensors {
            total.merge(sensor.quirks);
        }
        total
    }
}

/// Trajectory of one labelled marker; `None` marks a gap
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerTrajectory {
    pub label: String,
    pub positions: Vec<Option<Vector3>>,
}

impl MarkerTrajectory {
    /// Number of frames where the marker was visible
    pub fn visible_frames(&self) -> usize {
        self.positions.iter().filter(|p| p.is_some()).count()
    }
}

/// One analog channel recorded alongside the markers
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogChannel {
    pub label: String,
    pub samples: Vec<f64>,
}

/// Decoded motion-capture recording
#[derive(Debug, Clone, PartialEq)]
pub struct RawMocapStream {
    pub source: PathBuf,
    /// Native marker frame rate (Hz)
    pub frame_rate_hz: f64,
    /// Analog sample rate (Hz); a multiple of the frame rate
    pub analog_rate_hz: f64,
    pub markers: Vec<MarkerTrajectory>,
    pub analog: Vec<AnalogChannel>,
    pub frame_count: usize,
}

impl RawMocapStream {
    /// Marker by label, case-insensitive
    pub fn marker(&self, label: &str) -> Option<&MarkerTrajectory> {
        self.markers
            .iter()
            .find(|m| m.label.eq_ignore_ascii_case(label))
    }

    /// Analog channel by label, case-insensitive
    pub fn analog_channel(&self, label: &str) -> Option<&AnalogChannel> {
        self.analog
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(label))
    }

    /// Analog samples per marker frame
    pub fn analog_per_frame(&self) -> usize {
        if self.frame_rate_hz <= 0.0 {
            return 1;
        }
        ((self.analog_rate_hz / self.frame_rate_hz).round() as usize).max(1)
    }
}

//! SynchronizedTrialData - Sync Engine output
//!
//! Calibrated IMU table and mocap table sharing one time origin.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{ImuFormatRevision, Position, QuirkReport, SubjectId, TestName, Vector3};

/// IMU channel suffixes in column order
pub const IMU_AXES: [&str; 6] = ["acc_x", "acc_y", "acc_z", "gyr_x", "gyr_y", "gyr_z"];

/// Magnetometer channel suffixes
pub const MAG_AXES: [&str; 3] = ["mag_x", "mag_y", "mag_z"];

/// Synchronized trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynchronizedTrialData {
    pub subject: SubjectId,
    pub test: TestName,
    pub imu: ImuTable,
    pub mocap: MocapTable,
    pub alignment: AlignmentInfo,
    pub sources: TrialSources,
}

/// Calibrated IMU samples of all sensors, aligned by sample counter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImuTable {
    /// Native rate (Hz), shared by every sensor of the recording
    pub sampling_rate_hz: f64,

    /// Seconds relative to the common origin
    pub time_s: Vec<f64>,

    /// Body position -> channels
    pub sensors: BTreeMap<Position, ImuChannels>,
}

/// Channels of one sensor; `NaN` rows mark samples the sensor did not deliver
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImuChannels {
    /// Acceleration (m/s²)
    pub acc: Vec<Vector3>,
    /// Angular rate (deg/s)
    pub gyr: Vec<Vector3>,
    /// Magnetic field (µT)
    pub mag: Option<Vec<Vector3>>,
}

impl ImuTable {
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    /// Stable column names: `"<position>/<axis>"`
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for (position, channels) in &self.sensors {
            for axis in IMU_AXES {
                columns.push(format!("{position}/{axis}"));
            }
            if channels.mag.is_some() {
                for axis in MAG_AXES {
                    columns.push(format!("{position}/{axis}"));
                }
            }
        }
        columns
    }

    /// One row in `column_names` order
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        let mut row = Vec::new();
        for channels in self.sensors.values() {
            row.extend(channels.acc[index].to_array());
            row.extend(channels.gyr[index].to_array());
            if let Some(mag) = &channels.mag {
                row.extend(mag[index].to_array());
            }
        }
        Some(row)
    }
}

/// Marker positions; `None` marks a gap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MocapTable {
    /// Native frame rate (Hz)
    pub sampling_rate_hz: f64,

    /// Seconds relative to the common origin
    pub time_s: Vec<f64>,

    /// Lower-cased marker label -> positions
    pub markers: BTreeMap<String, Vec<Option<Vector3>>>,
}

impl MocapTable {
    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    /// Stable column names: `"<marker>/x"`, `"<marker>/y"`, `"<marker>/z"`
    pub fn column_names(&self) -> Vec<String> {
        self.markers
            .keys()
            .flat_map(|m| ["x", "y", "z"].map(|axis| format!("{m}/{axis}")))
            .collect()
    }
}

/// How the common origin was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginSource {
    /// Sync indices written in the subject metadata
    Metadata,
    /// Trigger edges found in both recordings
    DetectedTrigger,
    /// No trigger in at least one stream; both first samples were used
    FirstSampleFallback,
}

/// Diagnostics of the alignment step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentInfo {
    pub origin: OriginSource,
    /// Origin as IMU sample index in the uncropped recording
    pub imu_origin_sample: usize,
    /// Origin as mocap frame index in the uncropped recording
    pub mocap_origin_frame: usize,
    pub padding_s: f64,
    pub quirks: QuirkReport,
    /// Non-fatal problems, already logged
    pub warnings: Vec<String>,
}

/// Files a trial was built from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSources {
    pub imu: PathBuf,
    pub imu_format: ImuFormatRevision,
    pub mocap: PathBuf,
    pub calibration: PathBuf,
}

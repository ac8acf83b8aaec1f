//! CalibrationRecord - Calibration Loader output
//!
//! Per-sensor affine correction parameters produced by an external calibration procedure.
//! The numeric application lives in `sync_engine`; this module only describes the data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{HardwareId, SubjectId};

/// Row-major 3x3 matrix as stored in calibration files
pub type Matrix3x3 = [[f64; 3]; 3];

/// Identity matrix
pub const IDENTITY_3X3: Matrix3x3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// On-disk layout of `calibrations/<subject>.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationFile {
    /// Subject the calibration was recorded for (informational)
    #[serde(default)]
    pub subject: Option<String>,

    /// When the calibration session took place
    #[serde(default)]
    pub calibrated_at: Option<DateTime<Utc>>,

    /// Hardware id -> parameters
    pub sensors: BTreeMap<HardwareId, SensorCalibration>,
}

/// Calibration of one sensor unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorCalibration {
    /// Accelerometer correction
    pub acc: AxisCalibration,

    /// Gyroscope correction
    pub gyr: AxisCalibration,

    /// Gyroscope sensitivity to linear acceleration
    #[serde(default)]
    pub gyr_acc_sensitivity: Option<Matrix3x3>,
}

/// Affine correction of a 3-axis sensor
///
/// `calibrated = diag(scale)^-1 * misalignment^-1 * (raw - bias)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    /// Orientation offset between the sensing axes and the housing frame
    pub misalignment: Matrix3x3,

    /// Per-axis gain
    pub scale: [f64; 3],

    /// Per-axis zero offset, in raw units
    pub bias: [f64; 3],
}

impl AxisCalibration {
    /// Correction that leaves samples untouched
    pub fn identity() -> Self {
        Self {
            misalignment: IDENTITY_3X3,
            scale: [1.0; 3],
            bias: [0.0; 3],
        }
    }
}

impl SensorCalibration {
    /// Correction that leaves samples untouched
    pub fn identity() -> Self {
        Self {
            acc: AxisCalibration::identity(),
            gyr: AxisCalibration::identity(),
            gyr_acc_sensitivity: None,
        }
    }
}

/// Validated calibration of every sensor a subject wore
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationRecord {
    pub subject: SubjectId,
    pub calibrated_at: Option<DateTime<Utc>>,
    /// Keyed by lower-cased hardware id
    pub sensors: BTreeMap<HardwareId, SensorCalibration>,
}

impl CalibrationRecord {
    /// Parameters for a sensor, matching the hardware id case-insensitively
    pub fn sensor(&self, hardware_id: &str) -> Option<&SensorCalibration> {
        self.sensors.get(&hardware_id.to_ascii_lowercase())
    }
}

//! Calibration Loader
//!
//! Reads `calibrations/<subject>.json` and rejects records that cannot be applied.

use std::fs;
use std::path::Path;

use contracts::{
    AxisCalibration, CalibrationFile, CalibrationRecord, DatasetConfig, DatasetError, Matrix3x3,
    Result, SubjectId,
};
use tracing::{debug, instrument};

use crate::layout::DatasetLayout;

/// Smallest |det| accepted for a misalignment matrix
const MIN_DETERMINANT: f64 = 1e-9;

/// Calibration of every sensor a subject wore
///
/// Reads the file on every call; see [`CalibrationStore`](crate::CalibrationStore) for a
/// cached variant.
///
/// # Errors
/// - `CalibrationNotFound` if the subject has no calibration file
/// - `CalibrationFormat` if the file cannot be parsed or holds unusable parameters
#[instrument(name = "catalog_load_calibration", skip(config), fields(subject = %subject))]
pub fn load_calibration(
    config: &DatasetConfig,
    subject: &str,
    data_folder: Option<&Path>,
) -> Result<CalibrationRecord> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    let path = layout.calibration_path(subject);
    let bytes = read_calibration_bytes(subject, &path)?;
    parse_calibration(subject, &path, &bytes)
}

pub(crate) fn read_calibration_bytes(subject: &str, path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DatasetError::CalibrationNotFound {
            subject: subject.to_string(),
            path: path.to_path_buf(),
        },
        _ => DatasetError::Io(e),
    })
}

/// Parse and check the content of a calibration file
pub fn parse_calibration(subject: &str, path: &Path, bytes: &[u8]) -> Result<CalibrationRecord> {
    let file: CalibrationFile = serde_json::from_slice(bytes)
        .map_err(|e| DatasetError::calibration_format(path, e.to_string()))?;

    if file.sensors.is_empty() {
        return Err(DatasetError::calibration_format(path, "no sensors"));
    }

    let mut sensors = std::collections::BTreeMap::new();
    for (id, sensor) in file.sensors {
        check_axis(path, &id, "acc", &sensor.acc)?;
        check_axis(path, &id, "gyr", &sensor.gyr)?;
        if let Some(g) = &sensor.gyr_acc_sensitivity {
            if !is_finite_matrix(g) {
                return Err(DatasetError::calibration_format(
                    path,
                    format!("sensor '{id}': gyr_acc_sensitivity is not finite"),
                ));
            }
        }
        if sensors.insert(id.to_ascii_lowercase(), sensor).is_some() {
            return Err(DatasetError::calibration_format(
                path,
                format!("sensor '{id}' is listed more than once (ids are case-insensitive)"),
            ));
        }
    }

    debug!(sensors = sensors.len(), path = %path.display(), "calibration parsed");
    Ok(CalibrationRecord {
        subject: SubjectId::from(subject),
        calibrated_at: file.calibrated_at,
        sensors,
    })
}

fn check_axis(path: &Path, id: &str, axis: &str, cal: &AxisCalibration) -> Result<()> {
    if let Some(s) = cal.scale.iter().find(|s| !s.is_finite() || **s <= 0.0) {
        return Err(DatasetError::calibration_format(
            path,
            format!("sensor '{id}': {axis} scale must be finite and > 0, got {s}"),
        ));
    }
    if cal.bias.iter().any(|b| !b.is_finite()) {
        return Err(DatasetError::calibration_format(
            path,
            format!("sensor '{id}': {axis} bias is not finite"),
        ));
    }
    if !is_finite_matrix(&cal.misalignment) || determinant(&cal.misalignment).abs() < MIN_DETERMINANT {
        return Err(DatasetError::calibration_format(
            path,
            format!("sensor '{id}': {axis} misalignment matrix is singular"),
        ));
    }
    Ok(())
}

fn is_finite_matrix(m: &Matrix3x3) -> bool {
    m.iter().flatten().all(|v| v.is_finite())
}

fn determinant(m: &Matrix3x3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

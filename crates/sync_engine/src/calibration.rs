//! Affine IMU calibration
//!
//! `acc_cal = K⁻¹ R⁻¹ (acc_raw − b_a)`
//! `gyr_cal = K_g⁻¹ R_g⁻¹ (gyr_raw − G·acc_cal − b_g)`

use contracts::{AxisCalibration, Matrix3x3, SensorCalibration, Vector3};
use nalgebra::{Matrix3, Vector3 as Vec3};

pub(crate) fn matrix(m: &Matrix3x3) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| m[r][c])
}

#[inline]
pub(crate) fn to_na(v: Vector3) -> Vec3<f64> {
    Vec3::new(v.x, v.y, v.z)
}

#[inline]
pub(crate) fn from_na(v: Vec3<f64>) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

/// `R K` and its inverse for one axis group
#[derive(Debug, Clone, Copy)]
struct AxisTransform {
    forward: Matrix3<f64>,
    inverse: Matrix3<f64>,
    bias: Vec3<f64>,
}

impl AxisTransform {
    fn new(axis: &AxisCalibration) -> Option<Self> {
        let scale = Matrix3::from_diagonal(&Vec3::from(axis.scale));
        let forward = matrix(&axis.misalignment) * scale;
        let inverse = forward.try_inverse()?;
        Some(Self {
            forward,
            inverse,
            bias: Vec3::from(axis.bias),
        })
    }
}

/// Calibration of one sensor, with matrices inverted once
#[derive(Debug, Clone, Copy)]
pub struct CompiledCalibration {
    acc: AxisTransform,
    gyr: AxisTransform,
    g_sensitivity: Matrix3<f64>,
}

impl CompiledCalibration {
    /// `None` when a misalignment matrix is singular
    pub fn new(calibration: &SensorCalibration) -> Option<Self> {
        Some(Self {
            acc: AxisTransform::new(&calibration.acc)?,
            gyr: AxisTransform::new(&calibration.gyr)?,
            g_sensitivity: calibration
                .gyr_acc_sensitivity
                .as_ref()
                .map(matrix)
                .unwrap_or_else(Matrix3::zeros),
        })
    }

    /// Raw sample to physical units
    pub fn apply(&self, acc: Vector3, gyr: Vector3) -> (Vector3, Vector3) {
        let acc_cal = self.acc.inverse * (to_na(acc) - self.acc.bias);
        let gyr_cal =
            self.gyr.inverse * (to_na(gyr) - self.g_sensitivity * acc_cal - self.gyr.bias);
        (from_na(acc_cal), from_na(gyr_cal))
    }

    /// Calibrated sample back to raw sensor output
    pub fn invert(&self, acc_cal: Vector3, gyr_cal: Vector3) -> (Vector3, Vector3) {
        let acc_cal = to_na(acc_cal);
        let acc = self.acc.forward * acc_cal + self.acc.bias;
        let gyr = self.gyr.forward * to_na(gyr_cal) + self.g_sensitivity * acc_cal + self.gyr.bias;
        (from_na(acc), from_na(gyr))
    }

    /// Calibrate a whole channel pair in place
    pub fn apply_all(&self, acc: &mut [Vector3], gyr: &mut [Vector3]) {
        for (a, g) in acc.iter_mut().zip(gyr.iter_mut()) {
            (*a, *g) = self.apply(*a, *g);
        }
    }
}

/// Reverse a calibration; `None` for a singular misalignment matrix
pub fn invert_calibration(
    calibration: &SensorCalibration,
    acc_cal: &[Vector3],
    gyr_cal: &[Vector3],
) -> Option<(Vec<Vector3>, Vec<Vector3>)> {
    let compiled = CompiledCalibration::new(calibration)?;
    Some(
        acc_cal
            .iter()
            .zip(gyr_cal)
            .map(|(a, g)| compiled.invert(*a, *g))
            .unzip(),
    )
}

//! Foot-frame coordinate alignment
//!
//! Sensor positions are named `<side>_<location>` (`l_cavity`, `r_heel`, ...). Each foot
//! location has a fixed rotation from the sensor frame into the common foot frame, which
//! differs between the left and right foot for the asymmetric mountings.

use std::fmt;

use contracts::Vector3;
use nalgebra::{Matrix3, Rotation3, Vector3 as Vec3};

use crate::calibration::{from_na, to_na};

const FOOT_LOCATIONS: [&str; 5] = ["cavity", "heel", "lateral", "medial", "instep"];
const INSOLE: &str = "insole";
const FOOT_MARKERS: [&str; 4] = ["fcc", "toe", "fm5", "fm1"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Foot {
    Left,
    Right,
}

impl Foot {
    pub fn prefix(self) -> char {
        match self {
            Foot::Left => 'l',
            Foot::Right => 'r',
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "l" => Some(Foot::Left),
            "r" => Some(Foot::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Foot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Foot::Left => "left",
            Foot::Right => "right",
        })
    }
}

/// Sensor positions mounted on one foot
pub fn foot_sensors(foot: Foot, include_insole: bool) -> Vec<String> {
    FOOT_LOCATIONS
        .iter()
        .copied()
        .chain(include_insole.then_some(INSOLE))
        .map(|location| format!("{}_{location}", foot.prefix()))
        .collect()
}

/// Mocap markers placed on one foot
pub fn foot_markers(foot: Foot) -> Vec<String> {
    FOOT_MARKERS
        .iter()
        .map(|marker| format!("{}_{marker}", foot.prefix()))
        .collect()
}

fn rows(m: [[f64; 3]; 3]) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| m[r][c])
}

/// Sensor-to-foot rotation of a position; `None` for positions off the foot
pub fn foot_frame_rotation(position: &str) -> Option<Matrix3<f64>> {
    let (side, location) = position.split_once('_')?;
    let foot = Foot::from_prefix(side)?;

    let m = match (location, foot) {
        ("lateral", Foot::Left) | ("medial", Foot::Right) => {
            [[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]
        }
        ("lateral", Foot::Right) | ("medial", Foot::Left) => {
            [[0.0, -1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]]
        }
        ("instep" | "cavity", _) => [[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, 1.0]],
        ("heel", _) => [[0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]],
        ("insole", Foot::Left) => [[0.0, 1.0, 0.0], [-1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        ("insole", Foot::Right) => [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        _ => return None,
    };
    Some(rows(m))
}

/// Rotation about the sensor z axis correcting a wrongly attached sensor
pub fn mounting_correction(degrees: f64) -> Matrix3<f64> {
    Rotation3::from_axis_angle(&Vec3::z_axis(), degrees.to_radians()).into_inner()
}

/// Rotate every sample in place; NaN gaps stay NaN
pub fn rotate(rotation: &Matrix3<f64>, samples: &mut [Vector3]) {
    for v in samples.iter_mut() {
        *v = from_na(rotation * to_na(*v));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vector3, b: Vector3) -> bool {
        (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12 && (a.z - b.z).abs() < 1e-12
    }

    #[test]
    fn test_foot_sensor_names() {
        assert_eq!(
            foot_sensors(Foot::Left, true),
            ["l_cavity", "l_heel", "l_lateral", "l_medial", "l_instep", "l_insole"]
        );
        assert_eq!(foot_sensors(Foot::Right, false).len(), 5);
        assert_eq!(foot_markers(Foot::Right), ["r_fcc", "r_toe", "r_fm5", "r_fm1"]);
    }

    #[test]
    fn test_table_entries_are_rotations() {
        for foot in [Foot::Left, Foot::Right] {
            for position in foot_sensors(foot, true) {
                let m = foot_frame_rotation(&position).unwrap();
                assert!((m.determinant() - 1.0).abs() < 1e-12, "{position}");
                assert!((m * m.transpose() - Matrix3::identity()).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_mirrored_positions() {
        assert_eq!(foot_frame_rotation("l_lateral"), foot_frame_rotation("r_medial"));
        assert_eq!(foot_frame_rotation("l_heel"), foot_frame_rotation("r_heel"));
        assert_ne!(foot_frame_rotation("l_insole"), foot_frame_rotation("r_insole"));
    }

    #[test]
    fn test_unknown_positions() {
        assert!(foot_frame_rotation("sync").is_none());
        assert!(foot_frame_rotation("l_knee").is_none());
        assert!(foot_frame_rotation("x_heel").is_none());
    }

    #[test]
    fn test_heel_maps_sensor_x_to_foot_z() {
        let mut samples = [Vector3::new(1.0, 0.0, 0.0)];
        rotate(&foot_frame_rotation("l_heel").unwrap(), &mut samples);
        assert!(approx(samples[0], Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_half_turn_correction() {
        let mut samples = [Vector3::new(1.0, 2.0, 3.0), Vector3::NAN];
        rotate(&mounting_correction(180.0), &mut samples);
        assert!(approx(samples[0], Vector3::new(-1.0, -2.0, 3.0)));
        assert!(samples[1].x.is_nan());
    }
}

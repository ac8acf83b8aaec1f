//! Stride annotations shipped with the dataset
//!
//! - `data/<subject>/manual_stride_border.csv`: hand-labelled stride borders in IMU
//!   session samples
//! - `data/<subject>/mocap/<test>_steps.csv`: gait events the mocap pipeline derived with
//!   the Zeni algorithm, in mocap frames after the test start

use serde::{Deserialize, Serialize};

/// Foot a stride belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foot {
    #[serde(alias = "Left", alias = "l")]
    Left,
    #[serde(alias = "Right", alias = "r")]
    Right,
}

impl Foot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl std::fmt::Display for Foot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One manually labelled stride
///
/// `start` and `end` are IMU sample indices. Rows read for the whole subject count from the
/// start of the session, rows read for one test count from the start of that test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrideLabel {
    pub s_id: u64,
    #[serde(default)]
    pub foot: Option<Foot>,
    pub start: u64,
    pub end: u64,
}

/// One stride with its mocap gait events
///
/// All positions are mocap frames after the test start. Event columns are empty where the
/// algorithm found no event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MocapStrideEvent {
    pub s_id: u64,
    pub foot: Foot,
    pub start: f64,
    pub end: f64,
    /// Initial contact
    #[serde(default)]
    pub ic: Option<f64>,
    /// Terminal contact
    #[serde(default)]
    pub tc: Option<f64>,
    /// Minimal foot velocity (mid stance)
    #[serde(default)]
    pub min_vel: Option<f64>,
}

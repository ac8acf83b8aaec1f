//! Subject and trial metadata - Metadata Index output
//!
//! Mirrors `data/<subject>/meta_data.json`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{SubjectId, TestName};

/// Body position of a sensor, e.g. `"l_cavity"` or `"r_heel"`
pub type Position = String;

/// Hardware id of a sensor unit as written in the recording header, e.g. `"9e82"`
pub type HardwareId = String;

/// On-disk layout of `meta_data.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataFile {
    /// Body position -> sensor hardware id
    pub sensors: BTreeMap<Position, HardwareId>,

    /// Per-test attributes
    pub tests: BTreeMap<TestName, TestEntry>,

    /// Rotation about the sensor z-axis (degrees) for sensors that were mounted the wrong way round
    #[serde(default)]
    pub mounting_corrections: BTreeMap<Position, f64>,

    /// Free-form notes about the subject
    #[serde(default)]
    pub notes: Option<String>,
}

/// Attributes of one test inside `meta_data.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestEntry {
    /// Length of the test region after the trigger (seconds)
    #[serde(default)]
    pub duration_s: Option<f64>,

    /// IMU sample index of the trigger, overriding detection
    #[serde(default)]
    pub imu_sync_sample: Option<usize>,

    /// Mocap frame index of the trigger, overriding detection
    #[serde(default)]
    pub mocap_sync_frame: Option<usize>,

    /// First IMU sample of the test in session samples, the frame of reference of the
    /// manual stride labels
    #[serde(default)]
    pub imu_start_sample: Option<u64>,

    /// Last IMU sample of the test in session samples
    #[serde(default)]
    pub imu_stop_sample: Option<u64>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Parsed metadata of one subject
#[derive(Debug, Clone, Serialize)]
pub struct SubjectMetadata {
    pub subject: SubjectId,
    pub sensors: BTreeMap<Position, HardwareId>,
    pub trials: BTreeMap<TestName, TrialMetadata>,
    pub mounting_corrections: BTreeMap<Position, f64>,
    pub notes: Option<String>,
}

impl SubjectMetadata {
    /// Metadata of a single trial
    pub fn trial(&self, test: TestName) -> Option<&TrialMetadata> {
        self.trials.get(&test)
    }

    /// Tests the subject performed, in protocol order
    pub fn tests(&self) -> Vec<TestName> {
        self.trials.keys().copied().collect()
    }

    /// Reverse lookup: hardware id -> body position
    pub fn position_of(&self, hardware_id: &str) -> Option<&str> {
        self.sensors
            .iter()
            .find(|(_, id)| id.eq_ignore_ascii_case(hardware_id))
            .map(|(position, _)| position.as_str())
    }
}

/// Attributes of one (subject, test) trial
#[derive(Debug, Clone, Serialize)]
pub struct TrialMetadata {
    pub subject: SubjectId,
    pub test: TestName,
    pub duration_s: Option<f64>,
    /// Body position -> sensor hardware id
    pub sensors: BTreeMap<Position, HardwareId>,
    pub imu_sync_sample: Option<usize>,
    pub mocap_sync_frame: Option<usize>,
    pub imu_start_sample: Option<u64>,
    pub imu_stop_sample: Option<u64>,
    pub notes: Option<String>,
}

impl SubjectMetadata {
    /// Build from the on-disk representation
    pub fn from_file(subject: SubjectId, file: MetadataFile) -> Self {
        let trials = file
            .tests
            .into_iter()
            .map(|(test, entry)| {
                let trial = TrialMetadata {
                    subject: subject.clone(),
                    test,
                    duration_s: entry.duration_s,
                    sensors: file.sensors.clone(),
                    imu_sync_sample: entry.imu_sync_sample,
                    mocap_sync_frame: entry.mocap_sync_frame,
                    imu_start_sample: entry.imu_start_sample,
                    imu_stop_sample: entry.imu_stop_sample,
                    notes: entry.notes,
                };
                (test, trial)
            })
            .collect();

        Self {
            subject,
            sensors: file.sensors,
            trials,
            mounting_corrections: file.mounting_corrections,
            notes: file.notes,
        }
    }
}

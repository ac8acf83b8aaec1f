//! Synthetic dataset on disk
//!
//! Layout:
//! ```text
//! <root>/data/<subject>/meta_data.json
//! <root>/data/<subject>/imu/<test>.{bin,csv}
//! <root>/data/<subject>/mocap/<test>.c3d
//! <root>/calibrations/<subject>.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use contracts::{DatasetConfig, TestName};
use ingestion::fixtures::{encode_imu_v2, C3dFixture, ImuSensorFixture};
use serde_json::{json, Value};
use tempfile::TempDir;

pub const SUBJECT: &str = "54a9";
pub const TEST: TestName = TestName::Slow10;

/// IMU samples per sensor and mocap frames of a standard trial
pub const SAMPLES: usize = 300;
/// Trigger position: IMU sample at 100 Hz, analog sample at 200 Hz (= mocap frame 50)
pub const IMU_TRIGGER: usize = 100;
pub const MOCAP_TRIGGER: usize = 50;

pub fn identity_axis() -> Value {
    json!({"misalignment": [[1, 0, 0], [0, 1, 0], [0, 0, 1]], "scale": [1, 1, 1], "bias": [0, 0, 0]})
}

pub fn standard_sensors() -> Vec<ImuSensorFixture> {
    vec![
        ImuSensorFixture::new("9e82", 100.0, SAMPLES)
            .with_acc(|_| [0, 0, 2048])
            .with_gyr(|i| [(i % 50) as i16, 0, 0])
            .with_sync(|i| if i >= IMU_TRIGGER { 65535 } else { 0 }),
        ImuSensorFixture::new("c41a", 100.0, SAMPLES).with_acc(|_| [2048, 0, 0]),
    ]
}

pub fn standard_mocap() -> C3dFixture {
    C3dFixture::new(100.0, SAMPLES)
        .with_marker("L_TOE", |i| Some([i as f32, 1.0, 2.0]))
        .with_marker("R_TOE", |i| (i % 10 != 0).then_some([0.0, i as f32, 0.0]))
        .with_analog("sync", 2, |s| if s >= 2 * MOCAP_TRIGGER { 5.0 } else { 0.0 })
}

/// One subject's files
pub struct SubjectFiles {
    pub id: String,
    pub meta: Value,
    pub calibration: Value,
    /// Test name -> (file extension, bytes)
    pub imu: Vec<(TestName, &'static str, Vec<u8>)>,
    pub mocap: Vec<(TestName, Vec<u8>)>,
}

impl SubjectFiles {
    /// Two sensors and one `slow_10` trial with triggers in both streams
    pub fn standard(id: &str) -> Self {
        Self {
            id: id.to_string(),
            meta: json!({
                "sensors": {"l_cavity": "9E82", "r_heel": "c41a"},
                "tests": {"slow_10": {"duration_s": 1.0}}
            }),
            calibration: json!({
                "subject": id,
                "calibrated_at": "2019-05-02T10:00:00Z",
                "sensors": {
                    "9e82": {"acc": identity_axis(), "gyr": identity_axis()},
                    "c41a": {"acc": identity_axis(), "gyr": identity_axis()}
                }
            }),
            imu: vec![(TEST, "bin", encode_imu_v2(1_556_791_200_000, &standard_sensors()))],
            mocap: vec![(TEST, standard_mocap().encode())],
        }
    }

    pub fn with_imu(mut self, ext: &'static str, bytes: Vec<u8>) -> Self {
        self.imu = vec![(TEST, ext, bytes)];
        self
    }

    pub fn with_mocap(mut self, bytes: Vec<u8>) -> Self {
        self.mocap = vec![(TEST, bytes)];
        self
    }
}

/// Dataset root in a temporary folder, removed on drop
pub struct TestDataset {
    dir: TempDir,
}

impl TestDataset {
    pub fn new(subjects: &[SubjectFiles]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("calibrations")).unwrap();
        for subject in subjects {
            write_subject(dir.path(), subject);
        }
        Self { dir }
    }

    pub fn standard() -> Self {
        Self::new(&[SubjectFiles::standard(SUBJECT)])
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> DatasetConfig {
        let mut config = DatasetConfig::with_data_folder(self.root());
        config.load.align_coordinates = false;
        config
    }

    pub fn imu_path(&self, subject: &str, test: TestName, ext: &str) -> PathBuf {
        self.root()
            .join("data")
            .join(subject)
            .join("imu")
            .join(format!("{test}.{ext}"))
    }

    pub fn calibration_path(&self, subject: &str) -> PathBuf {
        self.root().join("calibrations").join(format!("{subject}.json"))
    }
}

fn write_subject(root: &Path, subject: &SubjectFiles) {
    let dir = root.join("data").join(&subject.id);
    fs::create_dir_all(dir.join("imu")).unwrap();
    fs::create_dir_all(dir.join("mocap")).unwrap();

    fs::write(dir.join("meta_data.json"), subject.meta.to_string()).unwrap();
    fs::write(
        root.join("calibrations").join(format!("{}.json", subject.id)),
        subject.calibration.to_string(),
    )
    .unwrap();
    for (test, ext, bytes) in &subject.imu {
        fs::write(dir.join("imu").join(format!("{test}.{ext}")), bytes).unwrap();
    }
    for (test, bytes) in &subject.mocap {
        fs::write(dir.join("mocap").join(format!("{test}.c3d")), bytes).unwrap();
    }
}

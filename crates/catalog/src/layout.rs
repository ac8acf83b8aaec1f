//! On-disk layout of the dataset
//!
//! ```text
//! <root>/calibrations/<subject>.json
//! <root>/data/<subject>/meta_data.json
//! <root>/data/<subject>/manual_stride_border.csv
//! <root>/data/<subject>/imu/<test>.bin | <test>.csv
//! <root>/data/<subject>/mocap/<test>.c3d
//! <root>/data/<subject>/mocap/<test>_steps.csv
//! ```

use std::path::{Path, PathBuf};

use contracts::{DatasetConfig, DatasetError, Result, TestName};

pub const DATA_DIR: &str = "data";
pub const CALIBRATION_DIR: &str = "calibrations";
pub const METADATA_FILE: &str = "meta_data.json";
pub const MANUAL_LABELS_FILE: &str = "manual_stride_border.csv";
pub const IMU_DIR: &str = "imu";
pub const MOCAP_DIR: &str = "mocap";

/// IMU file extensions in lookup order
pub const IMU_EXTENSIONS: [&str; 2] = ["bin", "csv"];

/// Path builder rooted at a resolved dataset folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

/// Raw recordings of one trial
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPaths {
    pub imu: PathBuf,
    pub mocap: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout of the effective root; `data_folder` overrides the configured one
    pub fn resolve(config: &DatasetConfig, data_folder: Option<&Path>) -> Result<Self> {
        config.resolve_data_folder(data_folder).map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn subject_dir(&self, subject: &str) -> PathBuf {
        self.data_dir().join(subject)
    }

    pub fn metadata_path(&self, subject: &str) -> PathBuf {
        self.subject_dir(subject).join(METADATA_FILE)
    }

    pub fn manual_labels_path(&self, subject: &str) -> PathBuf {
        self.subject_dir(subject).join(MANUAL_LABELS_FILE)
    }

    pub fn mocap_events_path(&self, subject: &str, test: TestName) -> PathBuf {
        self.mocap_dir(subject).join(format!("{test}_steps.csv"))
    }

    pub fn calibration_path(&self, subject: &str) -> PathBuf {
        self.root
            .join(CALIBRATION_DIR)
            .join(format!("{subject}.json"))
    }

    pub fn imu_dir(&self, subject: &str) -> PathBuf {
        self.subject_dir(subject).join(IMU_DIR)
    }

    pub fn mocap_dir(&self, subject: &str) -> PathBuf {
        self.subject_dir(subject).join(MOCAP_DIR)
    }

    /// First existing IMU recording of a test (`.bin` before `.csv`)
    pub fn imu_path(&self, subject: &str, test: TestName) -> Result<PathBuf> {
        let dir = self.imu_dir(subject);
        IMU_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{test}.{ext}")))
            .find(|p| p.is_file())
            .ok_or_else(|| {
                DatasetError::not_found(
                    format!("IMU recording of subject '{subject}' test '{test}'"),
                    dir.join(format!("{test}.bin")),
                )
            })
    }

    pub fn mocap_path(&self, subject: &str, test: TestName) -> Result<PathBuf> {
        let path = self.mocap_dir(subject).join(format!("{test}.c3d"));
        if path.is_file() {
            Ok(path)
        } else {
            Err(DatasetError::not_found(
                format!("mocap recording of subject '{subject}' test '{test}'"),
                path,
            ))
        }
    }

    /// Both recordings of a trial; fails if either is absent
    pub fn trial_paths(&self, subject: &str, test: TestName) -> Result<TrialPaths> {
        Ok(TrialPaths {
            imu: self.imu_path(subject, test)?,
            mocap: self.mocap_path(subject, test)?,
        })
    }
}

//! Dataset configuration contracts that can be shared across crates.
//!
//! A `DatasetConfig` is passed explicitly to every operation; there is no process-wide
//! data folder.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::{DatasetError, Result};

/// Subject recorded with a missing sensor
pub const WRONG_RECORDING_SUBJECT: &str = "6dbe";

/// Dataset configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatasetConfig {
    /// Dataset root (contains `data/`, `calibrations/` and the version-control metadata)
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// Revision the analysis was written against
    #[serde(default)]
    #[validate(length(min = 1, message = "expected_revision cannot be empty"))]
    pub expected_revision: Option<String>,

    /// List subjects in `excluded_subjects` anyway
    #[serde(default)]
    pub include_wrong_recording: bool,

    /// Subjects hidden from `list_subjects` by default
    #[serde(default = "default_excluded_subjects")]
    #[validate(custom(function = "validate_subject_ids"))]
    pub excluded_subjects: Vec<String>,

    /// Trial loading options
    #[serde(default)]
    #[validate(nested)]
    pub load: LoadOptions,
}

/// Options of `load_trial`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LoadOptions {
    /// Extra seconds kept before the trigger and after the test end
    #[serde(default)]
    #[validate(range(min = 0.0, max = 3600.0))]
    pub padding_s: f64,

    /// Rotate foot sensors into the common foot frame
    #[serde(default = "default_true")]
    pub align_coordinates: bool,

    /// Marker labels that must be present in every mocap recording
    #[serde(default)]
    pub required_markers: Vec<String>,

    /// Trigger detection parameters
    #[serde(default)]
    #[validate(nested)]
    pub trigger: TriggerConfig,
}

/// Rising-edge trigger detection on normalized sync channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TriggerConfig {
    /// Level a normalized channel has to reach (0, 1]
    #[validate(range(exclusive_min = 0.0, max = 1.0))]
    pub threshold: f64,

    /// Consecutive samples above threshold for an edge to count
    #[validate(range(min = 1))]
    pub min_high_samples: usize,

    /// Leading seconds ignored, to skip power-on transients
    #[validate(range(min = 0.0))]
    pub ignore_initial_s: f64,
}

fn default_excluded_subjects() -> Vec<String> {
    vec![WRONG_RECORDING_SUBJECT.to_string()]
}

fn default_true() -> bool {
    true
}

fn validate_subject_ids(ids: &[String]) -> std::result::Result<(), validator::ValidationError> {
    if ids.iter().any(|id| id.trim().is_empty()) {
        let mut err = validator::ValidationError::new("empty_subject");
        err.message = Some("subject ids cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_folder: None,
            expected_revision: None,
            include_wrong_recording: false,
            excluded_subjects: default_excluded_subjects(),
            load: LoadOptions::default(),
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            padding_s: 0.0,
            align_coordinates: true,
            required_markers: Vec::new(),
            trigger: TriggerConfig::default(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            min_high_samples: 3,
            ignore_initial_s: 0.0,
        }
    }
}

impl DatasetConfig {
    /// Config rooted at `data_folder`, defaults otherwise
    pub fn with_data_folder(data_folder: impl Into<PathBuf>) -> Self {
        Self {
            data_folder: Some(data_folder.into()),
            ..Self::default()
        }
    }

    /// Effective dataset root: `override_folder` beats `data_folder`
    ///
    /// # Errors
    /// `NotFound` when neither is set or the folder does not exist.
    pub fn resolve_data_folder(&self, override_folder: Option<&Path>) -> Result<PathBuf> {
        let folder = override_folder
            .or(self.data_folder.as_deref())
            .ok_or_else(|| DatasetError::not_found("no data folder configured", ""))?;

        if !folder.is_dir() {
            return Err(DatasetError::not_found("data folder", folder));
        }
        Ok(folder.to_path_buf())
    }

    /// Whether `subject` is hidden from listings
    pub fn is_excluded(&self, subject: &str) -> bool {
        !self.include_wrong_recording && self.excluded_subjects.iter().any(|s| s == subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DatasetConfig::default();
        assert_eq!(config.excluded_subjects, ["6dbe"]);
        assert!(config.load.align_coordinates);
        assert_eq!(config.load.padding_s, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: DatasetConfig = serde_json::from_str(r#"{"load": {"padding_s": 1.5}}"#).unwrap();
        assert_eq!(config.load.padding_s, 1.5);
        assert!(config.load.align_coordinates);
        assert_eq!(config.load.trigger, TriggerConfig::default());
        assert_eq!(config.excluded_subjects, ["6dbe"]);
    }

    #[test]
    fn test_negative_padding_rejected() {
        let mut config = DatasetConfig::default();
        config.load.padding_s = -1.0;
        let errors = config.validate().unwrap_err();
        assert!(errors.to_string().contains("padding_s"));
    }

    #[test]
    fn test_threshold_bounds() {
        let mut config = DatasetConfig::default();
        config.load.trigger.threshold = 0.0;
        assert!(config.validate().is_err());
        config.load.trigger.threshold = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_excluded_subject_visibility() {
        let mut config = DatasetConfig::default();
        assert!(config.is_excluded("6dbe"));
        assert!(!config.is_excluded("54a9"));
        config.include_wrong_recording = true;
        assert!(!config.is_excluded("6dbe"));
    }

    #[test]
    fn test_explicit_folder_wins() {
        let configured = std::env::temp_dir();
        let explicit = std::env::current_dir().unwrap();
        let config = DatasetConfig::with_data_folder(&configured);

        assert_eq!(config.resolve_data_folder(None).unwrap(), configured);
        assert_eq!(
            config.resolve_data_folder(Some(&explicit)).unwrap(),
            explicit
        );
    }

    #[test]
    fn test_no_folder_is_not_found() {
        let err = DatasetConfig::default().resolve_data_folder(None).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("no data folder configured"));
    }

    #[test]
    fn test_missing_folder_is_not_found() {
        let config = DatasetConfig::with_data_folder("/definitely/not/here/spd");
        assert!(config.resolve_data_folder(None).unwrap_err().is_not_found());
    }
}

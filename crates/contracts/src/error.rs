//! Layered error definitions
//!
//! Categorized by source: lookup / recording / calibration / metadata / revision / config

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum DatasetError {
    // ===== Lookup Errors =====
    /// Missing data folder, subject, trial or file
    #[error("not found: {what} ({})", path.display())]
    NotFound { what: String, path: PathBuf },

    // ===== Recording Errors =====
    /// Structurally invalid raw IMU or mocap recording
    #[error("corrupt recording '{}': {message}", path.display())]
    CorruptRecording { path: PathBuf, message: String },

    // ===== Calibration Errors =====
    /// No calibration file for the subject
    #[error("no calibration for subject '{subject}' ({})", path.display())]
    CalibrationNotFound { subject: String, path: PathBuf },

    /// Calibration file exists but cannot be used
    #[error("malformed calibration '{}': {message}", path.display())]
    CalibrationFormat { path: PathBuf, message: String },

    // ===== Metadata Errors =====
    /// Subject metadata file exists but cannot be used
    #[error("malformed metadata '{}': {message}", path.display())]
    MetadataFormat { path: PathBuf, message: String },

    // ===== Revision Errors =====
    /// Dataset is clean but checked out at another revision
    #[error("dataset at '{}' is at revision {actual}, expected {expected}", folder.display())]
    RevisionMismatch {
        folder: PathBuf,
        expected: String,
        actual: String,
    },

    /// Dataset has uncommitted or untracked changes
    #[error("dataset at '{}' has uncommitted changes", folder.display())]
    DirtyRepository { folder: PathBuf },

    /// Dataset folder is not under version control
    #[error("'{}' is not under version control", folder.display())]
    NotAVersionedFolder { folder: PathBuf },

    /// Expected revision does not name a commit in the dataset history
    #[error("'{revision}' is not a valid revision of the dataset at '{}'", folder.display())]
    UnknownRevision { folder: PathBuf, revision: String },

    /// Version-control client failed for a reason other than the above
    #[error("version control error: {message}")]
    VersionControl { message: String },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// Create lookup error
    pub fn not_found(what: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self::NotFound {
            what: what.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create corrupt recording error
    pub fn corrupt(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::CorruptRecording {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create calibration format error
    pub fn calibration_format(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::CalibrationFormat {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create metadata format error
    pub fn metadata_format(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::MetadataFormat {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create version-control client error
    pub fn version_control(message: impl Into<String>) -> Self {
        Self::VersionControl {
            message: message.into(),
        }
    }

    /// Whether the error means something was absent rather than broken
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::CalibrationNotFound { .. }
        )
    }

    /// Stable snake_case label, used as a metric label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::CorruptRecording { .. } => "corrupt_recording",
            Self::CalibrationNotFound { .. } => "calibration_not_found",
            Self::CalibrationFormat { .. } => "calibration_format",
            Self::MetadataFormat { .. } => "metadata_format",
            Self::RevisionMismatch { .. } => "revision_mismatch",
            Self::DirtyRepository { .. } => "dirty_repository",
            Self::NotAVersionedFolder { .. } => "not_a_versioned_folder",
            Self::UnknownRevision { .. } => "unknown_revision",
            Self::VersionControl { .. } => "version_control",
            Self::ConfigParse { .. } => "config_parse",
            Self::ConfigValidation { .. } => "config_validation",
            Self::Io(_) => "io",
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, DatasetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_file() {
        let err = DatasetError::corrupt("/data/54a9/imu/slow_10.bin", "header checksum mismatch");
        let msg = err.to_string();
        assert!(msg.contains("slow_10.bin"), "got: {msg}");
        assert!(msg.contains("checksum"), "got: {msg}");
    }

    #[test]
    fn test_is_not_found() {
        assert!(DatasetError::not_found("subject 'x'", "/data/x").is_not_found());
        assert!(DatasetError::CalibrationNotFound {
            subject: "x".into(),
            path: "/c/x.json".into()
        }
        .is_not_found());
        assert!(!DatasetError::corrupt("/f", "bad").is_not_found());
    }
}

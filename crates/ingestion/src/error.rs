//! Decoding errors
//!
//! Decoders work on in-memory bytes and know nothing about paths; readers attach the
//! file path when converting to `DatasetError::CorruptRecording`.

use std::path::Path;

use contracts::DatasetError;
use thiserror::Error;

/// Structural problem in a recording
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Fewer bytes than the structure needs
    #[error("truncated {section}: need {needed} bytes, {available} available")]
    Truncated {
        section: &'static str,
        needed: usize,
        available: usize,
    },

    /// File does not start with the expected signature
    #[error("bad magic: expected {expected}, found {found:02x?}")]
    BadMagic {
        expected: &'static str,
        found: Vec<u8>,
    },

    /// Known format, unsupported variant
    #[error("unsupported {what}: {value}")]
    Unsupported { what: &'static str, value: i64 },

    /// Stored header checksum differs from the computed one
    #[error("header checksum mismatch: stored {stored:#x}, computed {computed:#x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    /// Any other inconsistency
    #[error("{0}")]
    Invalid(String),

    /// CSV layer failure
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
}

impl DecodeError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Attach the recording path
    pub fn into_dataset_error(self, path: &Path) -> DatasetError {
        DatasetError::corrupt(path, self.to_string())
    }
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, DecodeError>;

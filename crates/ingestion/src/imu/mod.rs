//! IMU recordings
//!
//! One entry point, [`decode_imu`], dispatching on the detected [`ImuFormatRevision`].

pub(crate) mod binary;
mod csv;
mod samples;

use std::path::Path;

use contracts::{ImuFormatRevision, RawImuSensor};

use crate::error::{DecodeError, Result};

/// Decoded IMU content before the source path is attached
#[derive(Debug)]
pub(crate) struct ImuRecording {
    pub format: ImuFormatRevision,
    pub start_unix_ms: Option<i64>,
    pub sensors: Vec<RawImuSensor>,
}

/// Recording revision from the file signature, falling back to the extension
pub fn detect_format(path: &Path, data: &[u8]) -> Result<ImuFormatRevision> {
    if data.len() >= 5 && &data[..4] == binary::MAGIC {
        return binary::HeaderLayout::for_version(data[4]).map(|layout| layout.format);
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(ImuFormatRevision::Csv),
        _ => Err(DecodeError::BadMagic {
            expected: "SPDI",
            found: data.iter().take(4).copied().collect(),
        }),
    }
}

pub(crate) fn decode_imu(format: ImuFormatRevision, data: &[u8]) -> Result<ImuRecording> {
    match format {
        ImuFormatRevision::LegacyBinary | ImuFormatRevision::Binary => binary::decode(data),
        ImuFormatRevision::Csv => csv::decode(data),
    }
}

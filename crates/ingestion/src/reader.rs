//! File readers
//!
//! A reader turns one recording on disk into its raw stream. Format problems surface as
//! `DatasetError::CorruptRecording` carrying the path; a missing file is `NotFound`.

use std::path::Path;
use std::time::Instant;

use contracts::{DatasetError, RawImuStream, RawMocapStream, Result};
use tracing::{debug, instrument};

use crate::c3d;
use crate::imu::{decode_imu, detect_format};

/// Reads one kind of recording
pub trait StreamReader: Send + Sync {
    type Stream;

    /// Short name used in logs
    fn kind(&self) -> &'static str;

    /// Read and decode the file at `path`
    fn read(&self, path: &Path) -> Result<Self::Stream>;
}

fn read_file(kind: &str, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DatasetError::not_found(format!("{kind} recording"), path),
        _ => DatasetError::Io(e),
    })
}

/// IMU recordings in any supported revision
#[derive(Debug, Default, Clone, Copy)]
pub struct ImuReader;

impl StreamReader for ImuReader {
    type Stream = RawImuStream;

    fn kind(&self) -> &'static str {
        "IMU"
    }

    #[instrument(name = "imu_read", skip(self), fields(path = %path.display()))]
    fn read(&self, path: &Path) -> Result<RawImuStream> {
        let started = Instant::now();
        let data = read_file(self.kind(), path)?;

        let format = detect_format(path, &data).map_err(|e| e.into_dataset_error(path))?;
        let recording = decode_imu(format, &data).map_err(|e| e.into_dataset_error(path))?;

        debug!(
            ?format,
            bytes = data.len(),
            sensors = recording.sensors.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "decoded IMU recording"
        );

        Ok(RawImuStream {
            source: path.to_path_buf(),
            format: recording.format,
            start_unix_ms: recording.start_unix_ms,
            sensors: recording.sensors,
        })
    }
}

/// Motion-capture recordings (`.c3d`)
#[derive(Debug, Default, Clone, Copy)]
pub struct MocapReader;

impl StreamReader for MocapReader {
    type Stream = RawMocapStream;

    fn kind(&self) -> &'static str {
        "mocap"
    }

    #[instrument(name = "mocap_read", skip(self), fields(path = %path.display()))]
    fn read(&self, path: &Path) -> Result<RawMocapStream> {
        let started = Instant::now();
        let data = read_file(self.kind(), path)?;
        let stream = c3d::decode(&data, path).map_err(|e| e.into_dataset_error(path))?;

        debug!(
            frames = stream.frame_count,
            markers = stream.markers.len(),
            analog_channels = stream.analog.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "decoded mocap recording"
        );
        Ok(stream)
    }
}

/// Read an IMU recording
pub fn read_imu(path: &Path) -> Result<RawImuStream> {
    ImuReader.read(path)
}

/// Read a motion-capture recording
pub fn read_mocap(path: &Path) -> Result<RawMocapStream> {
    MocapReader.read(path)
}

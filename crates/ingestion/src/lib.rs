//! # Ingestion
//!
//! Raw stream readers for the recordings of one trial.
//!
//! - IMU: binary recordings in the legacy and current header revisions, and CSV exports.
//!   Firmware quirks (repeated or decreasing counters) are repaired and reported, never fatal.
//! - Motion capture: C3D files with marker trajectories and analog channels.
//!
//! ```ignore
//! use ingestion::{ImuReader, StreamReader};
//!
//! let stream = ImuReader.read(&paths.imu)?;
//! for sensor in &stream.sensors {
//!     println!("{} @ {} Hz", sensor.sensor_id, sensor.sampling_rate_hz);
//! }
//! ```

mod c3d;
mod cursor;
mod error;
mod imu;
mod reader;

#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;

pub use error::{DecodeError, Result};
pub use imu::detect_format;
pub use reader::{read_imu, read_mocap, ImuReader, MocapReader, StreamReader};

//! # Sync Engine
//!
//! Turns the raw recordings of one trial into calibrated IMU and mocap tables that share a
//! time origin.
//!
//! Responsibilities:
//! - Affine sensor calibration and foot-frame coordinate alignment
//! - Counter alignment of IMU sensors (gaps become NaN rows)
//! - Trigger detection through a pluggable [`TriggerDetector`], with a first-sample fallback
//! - Cropping to the test duration plus padding; no resampling
//!
//! ## Usage
//!
//! ```ignore
//! use contracts::{DatasetConfig, TestName};
//! use sync_engine::TrialLoader;
//!
//! let loader = TrialLoader::new(DatasetConfig::with_data_folder("/data/sensor_position"));
//! let trial = loader.load_trial("54a9", TestName::Slow10, None)?;
//! for column in trial.imu.column_names() {
//!     println!("{column}");
//! }
//! ```

mod alignment;
mod calibration;
mod engine;
mod trigger;
mod window;

pub use alignment::{foot_frame_rotation, foot_markers, foot_sensors, mounting_correction, Foot};
pub use calibration::{invert_calibration, CompiledCalibration};
pub use engine::{load_trial, TrialLoader};
pub use trigger::{
    Detection, DetectorChain, MetadataHint, RisingEdge, TriggerDetector, TriggerSignal,
    TRIGGER_CHANNELS,
};

pub use contracts::{OriginSource, SynchronizedTrialData};

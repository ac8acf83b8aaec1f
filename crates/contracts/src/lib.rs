//! # Contracts
//!
//! Shared data model for the sensor position dataset helper.
//! Every other crate in the workspace depends on this one; it depends on none of them.
//!
//! ## Time Model
//! - Every output table carries its own native sampling rate
//! - `time_s` indices of IMU and mocap tables are both 0 at the resolved common origin
//! - No resampling happens anywhere in the workspace

mod calibration;
mod config;
mod error;
mod labels;
mod metadata;
mod revision;
mod stream;
mod subject_id;
mod test_name;
mod trial;

pub use calibration::*;
pub use config::*;
pub use error::*;
pub use labels::*;
pub use metadata::*;
pub use revision::*;
pub use stream::*;
pub use subject_id::SubjectId;
pub use test_name::{TestName, UnknownTestName};
pub use trial::*;

//! # Catalog
//!
//! Dataset lookups that only need the dataset folder structure:
//! - Metadata Index: subjects, tests and trial metadata
//! - Calibration Loader: per-subject sensor calibration
//! - Label Catalog: manual stride labels and mocap gait events
//! - `CalibrationStore`: shared, self-invalidating calibration cache
//!
//! Every operation takes an explicit [`DatasetConfig`](contracts::DatasetConfig) and an
//! optional folder that overrides `config.data_folder` for that call.

mod calibration;
mod index;
mod labels;
mod layout;
mod store;

pub use calibration::{load_calibration, parse_calibration};
pub use index::{get_subject_metadata, list_subjects, list_tests, read_subject_metadata, trial_paths};
pub use labels::{get_manual_labels, get_manual_labels_for_test, get_mocap_events};
pub use layout::{DatasetLayout, TrialPaths};
pub use store::CalibrationStore;

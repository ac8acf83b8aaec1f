//! Metadata index and calibration cache against a dataset on disk.

use std::fs;

use catalog::{list_subjects, list_tests, trial_paths, CalibrationStore, DatasetLayout};
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{DatasetConfig, DatasetError, TestName, WRONG_RECORDING_SUBJECT};
use serde_json::json;

use crate::support::{identity_axis, SubjectFiles, TestDataset, SUBJECT, TEST};

fn two_subjects() -> TestDataset {
    TestDataset::new(&[
        SubjectFiles::standard(SUBJECT),
        SubjectFiles::standard(WRONG_RECORDING_SUBJECT),
    ])
}

#[test]
fn test_excluded_subject_hidden_by_default() {
    let dataset = two_subjects();
    let mut config = dataset.config();

    let subjects = list_subjects(&config, None).unwrap();
    assert_eq!(subjects.len(), 1);
    assert!(subjects.contains(SUBJECT));

    config.include_wrong_recording = true;
    let subjects = list_subjects(&config, None).unwrap();
    assert_eq!(subjects.len(), 2);
    assert!(subjects.contains(WRONG_RECORDING_SUBJECT));
}

#[test]
fn test_explicit_folder_beats_configured_folder() {
    let configured = TestDataset::standard();
    let explicit = two_subjects();
    let mut config = configured.config();
    config.include_wrong_recording = true;

    assert_eq!(list_subjects(&config, None).unwrap().len(), 1);
    assert_eq!(list_subjects(&config, Some(explicit.root())).unwrap().len(), 2);
    // the override applied to that call only
    assert_eq!(list_subjects(&config, None).unwrap().len(), 1);
}

#[test]
fn test_config_file_folder_and_override() {
    let configured = TestDataset::standard();
    let explicit = two_subjects();
    let toml = format!(
        "data_folder = {:?}\ninclude_wrong_recording = true\n",
        configured.root().display().to_string()
    );
    let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();

    assert_eq!(list_subjects(&config, None).unwrap().len(), 1);
    assert_eq!(list_subjects(&config, Some(explicit.root())).unwrap().len(), 2);
}

#[test]
fn test_no_folder_anywhere() {
    let err = list_subjects(&DatasetConfig::default(), None).unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn test_tests_and_paths() {
    let dataset = TestDataset::standard();
    let config = dataset.config();

    assert_eq!(list_tests(&config, SUBJECT, None).unwrap(), [TestName::Slow10]);

    let paths = trial_paths(&config, SUBJECT, TEST, None).unwrap();
    assert_eq!(paths.imu, dataset.imu_path(SUBJECT, TEST, "bin"));
    assert!(paths.mocap.ends_with("54a9/mocap/slow_10.c3d"));

    let err = trial_paths(&config, SUBJECT, TestName::Fast20, None).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("fast_20"), "{err}");

    let err = list_tests(&config, "ffff", None).unwrap_err();
    assert!(err.to_string().contains("ffff"), "{err}");
}

#[test]
fn test_calibration_store_sees_edits() {
    let dataset = TestDataset::standard();
    let config = dataset.config();
    let store = CalibrationStore::new();

    let first = store.get(&config, SUBJECT, None).unwrap();
    let again = store.get(&config, SUBJECT, None).unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &again));
    assert_eq!(first.sensor("9E82").unwrap().acc.bias, [0.0; 3]);

    let mut biased = identity_axis();
    biased["bias"] = json!([0.5, 0.0, 0.0]);
    let edited = json!({
        "subject": SUBJECT,
        "sensors": {"9e82": {"acc": biased, "gyr": identity_axis()}}
    });
    fs::write(dataset.calibration_path(SUBJECT), edited.to_string()).unwrap();

    let fresh = store.get(&config, SUBJECT, None).unwrap();
    assert_eq!(fresh.sensor("9e82").unwrap().acc.bias, [0.5, 0.0, 0.0]);
    assert!(fresh.sensor("c41a").is_none());
    assert_eq!(store.len(), 1);

    let layout = DatasetLayout::resolve(&config, None).unwrap();
    assert!(store.invalidate(SUBJECT, layout.root()));
    assert!(store.is_empty());
}

#[test]
fn test_missing_calibration() {
    let dataset = TestDataset::standard();
    fs::remove_file(dataset.calibration_path(SUBJECT)).unwrap();

    let err = CalibrationStore::new()
        .get(&dataset.config(), SUBJECT, None)
        .unwrap_err();
    assert!(matches!(err, DatasetError::CalibrationNotFound { .. }), "{err}");
}

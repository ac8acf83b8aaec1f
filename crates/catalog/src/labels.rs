//! Label Catalog
//!
//! Stride annotations that ship with the dataset: manual stride borders per subject and
//! mocap gait events per trial. Pure reads, like the Metadata Index.

use std::fs;
use std::path::Path;

use contracts::{DatasetConfig, DatasetError, MocapStrideEvent, Result, StrideLabel, TestName};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::index::read_metadata_at;
use crate::layout::DatasetLayout;

/// Manual stride labels of a subject, in IMU session samples
///
/// # Errors
/// - `NotFound` when the subject or its label file is absent
/// - `MetadataFormat` when a row is malformed or ends before it starts
#[instrument(name = "catalog_get_manual_labels", skip(config), fields(subject = %subject))]
pub fn get_manual_labels(
    config: &DatasetConfig,
    subject: &str,
    data_folder: Option<&Path>,
) -> Result<Vec<StrideLabel>> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    read_manual_labels(&layout, subject)
}

/// Manual stride labels that lie fully inside one test, counted from the test start
///
/// The test region is `imu_start_sample..=imu_stop_sample` from the subject metadata.
///
/// # Errors
/// - `NotFound` for an unknown subject, a test the subject did not perform, or a missing
///   label file
/// - `MetadataFormat` when the test has no IMU region or the label file is malformed
#[instrument(name = "catalog_get_manual_labels_for_test", skip(config), fields(subject = %subject, test = %test))]
pub fn get_manual_labels_for_test(
    config: &DatasetConfig,
    subject: &str,
    test: TestName,
    data_folder: Option<&Path>,
) -> Result<Vec<StrideLabel>> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    let meta = read_metadata_at(&layout, subject)?;
    let metadata_path = layout.metadata_path(subject);
    let trial = meta.trial(test).ok_or_else(|| {
        DatasetError::not_found(format!("test '{test}' of subject '{subject}'"), &metadata_path)
    })?;
    let (Some(first), Some(last)) = (trial.imu_start_sample, trial.imu_stop_sample) else {
        return Err(DatasetError::metadata_format(
            &metadata_path,
            format!("test '{test}' has no imu_start_sample/imu_stop_sample"),
        ));
    };

    let labels: Vec<StrideLabel> = read_manual_labels(&layout, subject)?
        .into_iter()
        .filter(|label| label.start >= first && label.end <= last)
        .map(|label| StrideLabel {
            start: label.start - first,
            end: label.end - first,
            ..label
        })
        .collect();
    debug!(strides = labels.len(), first, last, "labels of test selected");
    Ok(labels)
}

/// Mocap gait events of one trial, in mocap frames after the test start
///
/// # Errors
/// - `NotFound` when the subject or the event file is absent
/// - `MetadataFormat` when a row is malformed or ends before it starts
#[instrument(name = "catalog_get_mocap_events", skip(config), fields(subject = %subject, test = %test))]
pub fn get_mocap_events(
    config: &DatasetConfig,
    subject: &str,
    test: TestName,
    data_folder: Option<&Path>,
) -> Result<Vec<MocapStrideEvent>> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    let path = layout.mocap_events_path(subject, test);
    let events: Vec<MocapStrideEvent> = read_table(
        &path,
        || format!("mocap events of subject '{subject}' test '{test}'"),
    )?;
    for (row, event) in events.iter().enumerate() {
        if !event.start.is_finite() || !event.end.is_finite() || event.end < event.start {
            return Err(DatasetError::metadata_format(
                &path,
                format!("stride {} (row {}): invalid range {}..{}", event.s_id, row + 1, event.start, event.end),
            ));
        }
    }
    Ok(events)
}

fn read_manual_labels(layout: &DatasetLayout, subject: &str) -> Result<Vec<StrideLabel>> {
    let subject_dir = layout.subject_dir(subject);
    if !subject_dir.is_dir() {
        return Err(DatasetError::not_found(format!("subject '{subject}'"), subject_dir));
    }

    let path = layout.manual_labels_path(subject);
    let labels: Vec<StrideLabel> =
        read_table(&path, || format!("manual stride labels of subject '{subject}'"))?;
    if let Some(bad) = labels.iter().find(|l| l.end < l.start) {
        return Err(DatasetError::metadata_format(
            &path,
            format!("stride {} ends at {} before it starts at {}", bad.s_id, bad.end, bad.start),
        ));
    }
    Ok(labels)
}

/// Rows of a headed CSV table; columns are matched by name, extra columns are ignored
fn read_table<T: DeserializeOwned>(path: &Path, what: impl FnOnce() -> String) -> Result<Vec<T>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::not_found(what(), path));
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_slice());
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| DatasetError::metadata_format(path, e.to_string()))?;
    debug!(rows = rows.len(), path = %path.display(), "table read");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Foot;

    const META: &str = r#"{
        "sensors": {"l_cavity": "9e82"},
        "tests": {
            "slow_10": {"imu_start_sample": 1000, "imu_stop_sample": 2000},
            "long": {}
        }
    }"#;

    const LABELS: &str = "\
s_id,foot,start,end
0,left,900,1100
1,left,1100,1300
2,right,1150,1350
3,right,1800,2000
4,left,1900,2100
";

    const STEPS: &str = "\
s_id,foot,start,end,ic,tc,min_vel
0,left,10,120,15.0,80.0,40.0
1,right,60,170,,130.0,90.0
";

    fn dataset() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let subject = dir.path().join("data/54a9");
        fs::create_dir_all(subject.join("mocap")).unwrap();
        fs::write(subject.join("meta_data.json"), META).unwrap();
        fs::write(subject.join("manual_stride_border.csv"), LABELS).unwrap();
        fs::write(subject.join("mocap/slow_10_steps.csv"), STEPS).unwrap();
        dir
    }

    fn config_for(dir: &tempfile::TempDir) -> DatasetConfig {
        DatasetConfig::with_data_folder(dir.path())
    }

    #[test]
    fn test_manual_labels_whole_session() {
        let dir = dataset();
        let labels = get_manual_labels(&config_for(&dir), "54a9", None).unwrap();
        assert_eq!(labels.len(), 5);
        assert_eq!(labels[2].foot, Some(Foot::Right));
        assert_eq!((labels[0].start, labels[0].end), (900, 1100));
    }

    #[test]
    fn test_manual_labels_for_test_are_relative() {
        let dir = dataset();
        let labels =
            get_manual_labels_for_test(&config_for(&dir), "54a9", TestName::Slow10, None).unwrap();
        // strides crossing either border are left out
        let ids: Vec<u64> = labels.iter().map(|l| l.s_id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!((labels[0].start, labels[0].end), (100, 300));
        assert_eq!((labels[2].start, labels[2].end), (800, 1000));
    }

    #[test]
    fn test_manual_labels_without_foot_column() {
        let dir = dataset();
        fs::write(
            dir.path().join("data/54a9/manual_stride_border.csv"),
            "s_id,start,end\n7,10,20\n",
        )
        .unwrap();
        let labels = get_manual_labels(&config_for(&dir), "54a9", None).unwrap();
        assert_eq!(labels[0].foot, None);
        assert_eq!(labels[0].s_id, 7);
    }

    #[test]
    fn test_test_without_imu_region() {
        let dir = dataset();
        let err = get_manual_labels_for_test(&config_for(&dir), "54a9", TestName::Long, None)
            .unwrap_err();
        assert!(matches!(err, DatasetError::MetadataFormat { .. }), "{err}");
        assert!(err.to_string().contains("imu_start_sample"));
    }

    #[test]
    fn test_test_not_performed() {
        let dir = dataset();
        let err = get_manual_labels_for_test(&config_for(&dir), "54a9", TestName::Fast20, None)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_missing_label_file() {
        let dir = dataset();
        fs::remove_file(dir.path().join("data/54a9/manual_stride_border.csv")).unwrap();
        let err = get_manual_labels(&config_for(&dir), "54a9", None).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("manual stride labels"));
    }

    #[test]
    fn test_malformed_label_row() {
        let dir = dataset();
        fs::write(
            dir.path().join("data/54a9/manual_stride_border.csv"),
            "s_id,foot,start,end\n0,left,abc,10\n",
        )
        .unwrap();
        let err = get_manual_labels(&config_for(&dir), "54a9", None).unwrap_err();
        assert!(matches!(err, DatasetError::MetadataFormat { .. }), "{err}");
    }

    #[test]
    fn test_inverted_label_rejected() {
        let dir = dataset();
        fs::write(
            dir.path().join("data/54a9/manual_stride_border.csv"),
            "s_id,foot,start,end\n0,left,50,10\n",
        )
        .unwrap();
        let err = get_manual_labels(&config_for(&dir), "54a9", None).unwrap_err();
        assert!(err.to_string().contains("before it starts"));
    }

    #[test]
    fn test_mocap_events() {
        let dir = dataset();
        let events = get_mocap_events(&config_for(&dir), "54a9", TestName::Slow10, None).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].foot, Foot::Left);
        assert_eq!(events[0].ic, Some(15.0));
        assert_eq!(events[1].ic, None);
        assert_eq!(events[1].tc, Some(130.0));
    }

    #[test]
    fn test_missing_mocap_events() {
        let dir = dataset();
        let err = get_mocap_events(&config_for(&dir), "54a9", TestName::Long, None).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("long"));
    }

    #[test]
    fn test_unknown_foot_rejected() {
        let dir = dataset();
        fs::write(
            dir.path().join("data/54a9/mocap/slow_10_steps.csv"),
            "s_id,foot,start,end\n0,both,1,2\n",
        )
        .unwrap();
        let err = get_mocap_events(&config_for(&dir), "54a9", TestName::Slow10, None).unwrap_err();
        assert!(matches!(err, DatasetError::MetadataFormat { .. }), "{err}");
    }
}

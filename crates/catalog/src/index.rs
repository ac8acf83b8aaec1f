//! Metadata Index
//!
//! Subject discovery and `meta_data.json` parsing. Pure reads.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use contracts::{
    DatasetConfig, DatasetError, MetadataFile, Result, SubjectId, SubjectMetadata, TestName,
    TrialMetadata,
};
use tracing::{debug, instrument};

use crate::layout::{DatasetLayout, TrialPaths};

/// Valid subject folder name lengths
const SUBJECT_NAME_LENGTHS: [usize; 2] = [4, 6];

/// All subjects of the dataset
///
/// Entries listed in `config.excluded_subjects` are hidden unless
/// `config.include_wrong_recording` is set.
///
/// # Errors
/// `NotFound` when the root has no `data/` folder, the folder is empty, or it contains
/// entries that are not subject folders.
#[instrument(name = "catalog_list_subjects", skip(config))]
pub fn list_subjects(
    config: &DatasetConfig,
    data_folder: Option<&Path>,
) -> Result<BTreeSet<SubjectId>> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    let data_dir = layout.data_dir();
    if !data_dir.is_dir() {
        return Err(DatasetError::not_found("dataset 'data' folder", &data_dir));
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(&data_dir)? {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }

    if names.is_empty() || !names.iter().all(|n| SUBJECT_NAME_LENGTHS.contains(&n.len())) {
        return Err(DatasetError::not_found(
            "subject folders; the selected folder does not seem to be correct",
            &data_dir,
        ));
    }

    let subjects: BTreeSet<SubjectId> = names
        .into_iter()
        .filter(|n| !config.is_excluded(n))
        .map(SubjectId::from)
        .collect();

    debug!(count = subjects.len(), "subjects listed");
    Ok(subjects)
}

/// Whole parsed metadata of a subject
///
/// # Errors
/// - `NotFound` when the subject folder or its metadata file is absent
/// - `MetadataFormat` when the file is malformed, names an unknown test, or lists no tests
#[instrument(name = "catalog_read_subject_metadata", skip(config), fields(subject = %subject))]
pub fn read_subject_metadata(
    config: &DatasetConfig,
    subject: &str,
    data_folder: Option<&Path>,
) -> Result<SubjectMetadata> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    read_metadata_at(&layout, subject)
}

pub(crate) fn read_metadata_at(layout: &DatasetLayout, subject: &str) -> Result<SubjectMetadata> {
    let subject_dir = layout.subject_dir(subject);
    if !subject_dir.is_dir() {
        return Err(DatasetError::not_found(
            format!("subject '{subject}'"),
            subject_dir,
        ));
    }

    let path = layout.metadata_path(subject);
    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::not_found(
                format!("metadata of subject '{subject}'"),
                path,
            ));
        }
        Err(e) => return Err(e.into()),
    };

    let file: MetadataFile = serde_json::from_slice(&content)
        .map_err(|e| DatasetError::metadata_format(&path, e.to_string()))?;
    if file.tests.is_empty() {
        return Err(DatasetError::metadata_format(&path, "no tests listed"));
    }
    check_tests(&path, &file)?;

    Ok(SubjectMetadata::from_file(SubjectId::from(subject), file))
}

fn check_tests(path: &Path, file: &MetadataFile) -> Result<()> {
    for (test, entry) in &file.tests {
        if let Some(duration) = entry.duration_s {
            if !duration.is_finite() || duration < 0.0 {
                return Err(DatasetError::metadata_format(
                    path,
                    format!("test '{test}': duration_s must be finite and >= 0, got {duration}"),
                ));
            }
        }
        if let (Some(start), Some(stop)) = (entry.imu_start_sample, entry.imu_stop_sample) {
            if stop < start {
                return Err(DatasetError::metadata_format(
                    path,
                    format!("test '{test}': imu_stop_sample {stop} is before imu_start_sample {start}"),
                ));
            }
        }
    }
    Ok(())
}

/// Per-test metadata of a subject
#[instrument(name = "catalog_get_subject_metadata", skip(config), fields(subject = %subject))]
pub fn get_subject_metadata(
    config: &DatasetConfig,
    subject: &str,
    data_folder: Option<&Path>,
) -> Result<BTreeMap<TestName, TrialMetadata>> {
    read_subject_metadata(config, subject, data_folder).map(|meta| meta.trials)
}

/// Tests a subject performed, in protocol order
pub fn list_tests(
    config: &DatasetConfig,
    subject: &str,
    data_folder: Option<&Path>,
) -> Result<Vec<TestName>> {
    read_subject_metadata(config, subject, data_folder).map(|meta| meta.tests())
}

/// Recordings of a trial the subject's metadata lists
///
/// # Errors
/// `NotFound` for an unknown subject, a test the subject did not perform, or a missing file.
pub fn trial_paths(
    config: &DatasetConfig,
    subject: &str,
    test: TestName,
    data_folder: Option<&Path>,
) -> Result<TrialPaths> {
    let layout = DatasetLayout::resolve(config, data_folder)?;
    let meta = read_metadata_at(&layout, subject)?;
    if meta.trial(test).is_none() {
        return Err(DatasetError::not_found(
            format!("test '{test}' of subject '{subject}'"),
            layout.metadata_path(subject),
        ));
    }
    layout.trial_paths(subject, test)
}

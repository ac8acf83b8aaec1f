//! Revision guard in front of trial loading.

use contracts::{DatasetError, OriginSource};
use revision_guard::{current_revision, ensure_configured_revision, ensure_revision, MockVcs};
use sync_engine::load_trial;

use crate::support::{TestDataset, SUBJECT, TEST};

const HEAD: &str = "3b18e512dba79e4c8300dd08aeb37f8e728b8dad";

#[test]
fn test_guarded_load() {
    let dataset = TestDataset::standard();
    let vcs = MockVcs::new(HEAD).with_revision("v1.0", HEAD);

    ensure_revision(&vcs, dataset.root(), "v1.0").unwrap();
    let trial = load_trial(&dataset.config(), SUBJECT, TEST, None).unwrap();
    assert_eq!(trial.alignment.origin, OriginSource::DetectedTrigger);

    let revision = current_revision(&vcs, dataset.root()).unwrap();
    assert_eq!(revision.commit, HEAD);
    assert!(!revision.dirty);
}

#[test]
fn test_dirty_dataset_refused() {
    let dataset = TestDataset::standard();
    let vcs = MockVcs::new(HEAD).dirty();

    let err = ensure_revision(&vcs, dataset.root(), HEAD).unwrap_err();
    assert!(matches!(err, DatasetError::DirtyRepository { .. }), "{err}");
}

#[test]
fn test_plain_folder_is_not_versioned() {
    let dataset = TestDataset::standard();
    let mut config = dataset.config();
    config.expected_revision = Some(HEAD.to_string());

    // a temporary folder is never the root of a git working copy
    let err = ensure_configured_revision(&config, None).unwrap_err();
    assert!(
        matches!(
            err,
            DatasetError::NotAVersionedFolder { .. } | DatasetError::VersionControl { .. }
        ),
        "{err}"
    );
}

#[test]
fn test_no_expected_revision() {
    let dataset = TestDataset::standard();
    let err = ensure_configured_revision(&dataset.config(), None).unwrap_err();
    assert!(matches!(err, DatasetError::ConfigValidation { .. }), "{err}");
}

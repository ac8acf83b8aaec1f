//! Revision checks
//!
//! Repository state is queried on every call and never cached.

use std::path::Path;

use contracts::{DatasetConfig, DatasetError, DatasetRevision, Result};
use tracing::{info, instrument, warn};

use crate::git::GitCli;
use crate::vcs::VersionControl;

fn require_versioned(vcs: &dyn VersionControl, folder: &Path) -> Result<()> {
    if vcs.is_versioned(folder)? {
        Ok(())
    } else {
        Err(DatasetError::NotAVersionedFolder {
            folder: folder.to_path_buf(),
        })
    }
}

/// Checked-out commit and dirty flag of the dataset folder
#[instrument(name = "revision_current", skip(vcs), fields(folder = %folder.display()))]
pub fn current_revision(vcs: &dyn VersionControl, folder: &Path) -> Result<DatasetRevision> {
    require_versioned(vcs, folder)?;
    Ok(DatasetRevision {
        commit: vcs.head(folder)?,
        dirty: vcs.is_dirty(folder)?,
    })
}

/// Fail unless the dataset folder is a clean checkout of `expected`
///
/// # Errors
/// Checked in this order:
/// - `NotAVersionedFolder`: `folder` is not a working copy root
/// - `DirtyRepository`: modified or untracked files, whatever the revision
/// - `UnknownRevision`: `expected` names no commit
/// - `RevisionMismatch`: clean, but checked out at another commit
#[instrument(name = "revision_ensure", skip(vcs), fields(folder = %folder.display()))]
pub fn ensure_revision(vcs: &dyn VersionControl, folder: &Path, expected: &str) -> Result<()> {
    require_versioned(vcs, folder)?;

    if vcs.is_dirty(folder)? {
        warn!("dataset has uncommitted changes");
        return Err(DatasetError::DirtyRepository {
            folder: folder.to_path_buf(),
        });
    }

    let resolved = vcs
        .resolve(folder, expected)?
        .ok_or_else(|| DatasetError::UnknownRevision {
            folder: folder.to_path_buf(),
            revision: expected.to_string(),
        })?;
    let head = vcs.head(folder)?;

    if head != resolved {
        warn!(expected, %resolved, %head, "dataset revision mismatch");
        let expected = if expected == resolved {
            resolved
        } else {
            format!("{expected} ({resolved})")
        };
        return Err(DatasetError::RevisionMismatch {
            folder: folder.to_path_buf(),
            expected,
            actual: head,
        });
    }

    info!(%head, "dataset revision verified");
    Ok(())
}

/// [`ensure_revision`] against `config.expected_revision` using the `git` executable
///
/// # Errors
/// `ConfigValidation` when no revision is configured, otherwise as [`ensure_revision`].
pub fn ensure_configured_revision(config: &DatasetConfig, data_folder: Option<&Path>) -> Result<()> {
    let expected = config.expected_revision.as_deref().ok_or_else(|| {
        DatasetError::config_validation("expected_revision", "no expected revision configured")
    })?;
    let folder = config.resolve_data_folder(data_folder)?;
    ensure_revision(&GitCli::default(), &folder, expected)
}

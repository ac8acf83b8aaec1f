//! Version-control client abstraction
//!
//! The guard only needs four questions answered about a folder; [`GitCli`](crate::GitCli)
//! answers them with the `git` executable and [`MockVcs`](crate::MockVcs) from memory.

use std::path::Path;

use contracts::Result;

/// Version-control client
pub trait VersionControl: Send + Sync {
    /// Whether `folder` is the root of a working copy
    fn is_versioned(&self, folder: &Path) -> Result<bool>;

    /// Full commit id of the checked-out revision
    fn head(&self, folder: &Path) -> Result<String>;

    /// Full commit id `revision` names, `None` if it names nothing
    ///
    /// Accepts anything the client understands: hashes, abbreviations, tags, branches.
    fn resolve(&self, folder: &Path, revision: &str) -> Result<Option<String>>;

    /// Whether tracked files are modified or untracked files exist
    fn is_dirty(&self, folder: &Path) -> Result<bool>;
}

//! DatasetRevision - Revision Guard query result

use serde::Serialize;
use std::fmt;

/// Version-control state of the dataset folder at the moment of the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetRevision {
    /// Full commit id of the checked-out revision
    pub commit: String,
    /// Whether tracked or untracked files differ from that commit
    pub dirty: bool,
}

impl fmt::Display for DatasetRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dirty {
            write!(f, "{} (dirty)", self.commit)
        } else {
            f.write_str(&self.commit)
        }
    }
}

//! # Revision Guard
//!
//! Binds an analysis to an exact snapshot of the dataset folder.
//!
//! ```ignore
//! use revision_guard::{ensure_revision, GitCli};
//!
//! ensure_revision(&GitCli::default(), Path::new("/data/sensor_position"), "v1.0")?;
//! ```

mod git;
mod guard;
mod mock;
mod vcs;

pub use git::GitCli;
pub use guard::{current_revision, ensure_configured_revision, ensure_revision};
pub use mock::MockVcs;
pub use vcs::VersionControl;

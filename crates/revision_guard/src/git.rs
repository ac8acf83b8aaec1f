//! `git` executable client

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use contracts::{DatasetError, Result};
use tracing::{debug, instrument};

use crate::vcs::VersionControl;

/// Runs `git -C <folder> ...`
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run<I, S>(&self, folder: &Path, args: I) -> Result<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Command::new(&self.program)
            .arg("-C")
            .arg(folder)
            .args(args)
            .output()
            .map_err(|e| {
                DatasetError::version_control(format!(
                    "failed to run '{}': {e}",
                    self.program.display()
                ))
            })
    }

    /// Trimmed stdout of a command that has to succeed
    fn stdout<I, S>(&self, folder: &Path, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = self.run(folder, args)?;
        if !output.status.success() {
            return Err(DatasetError::version_control(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    #[instrument(name = "git_is_versioned", skip(self), fields(folder = %folder.display()))]
    fn is_versioned(&self, folder: &Path) -> Result<bool> {
        let output = self.run(folder, ["rev-parse", "--show-toplevel"])?;
        if !output.status.success() {
            return Ok(false);
        }
        // a subfolder of some other working copy does not count
        let toplevel = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        let same = match (toplevel.canonicalize(), folder.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        debug!(toplevel = %toplevel.display(), same, "working copy root");
        Ok(same)
    }

    fn head(&self, folder: &Path) -> Result<String> {
        self.stdout(folder, ["rev-parse", "--verify", "HEAD"])
    }

    fn resolve(&self, folder: &Path, revision: &str) -> Result<Option<String>> {
        let output = self.run(
            folder,
            ["rev-parse", "--verify", "--quiet", format!("{revision}^{{commit}}").as_str()],
        )?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    }

    fn is_dirty(&self, folder: &Path) -> Result<bool> {
        let status = self.stdout(folder, ["status", "--porcelain", "--untracked-files=all"])?;
        Ok(!status.is_empty())
    }
}

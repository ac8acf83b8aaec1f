//! In-memory version-control client for tests

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use contracts::{DatasetError, Result};

use crate::vcs::VersionControl;

/// Mock client answering from a fixed repository state
///
/// Every call is recorded so tests can check the order of the guard's questions.
#[derive(Debug)]
pub struct MockVcs {
    versioned: bool,
    head: String,
    dirty: bool,
    revisions: HashMap<String, String>,
    fail_with: Option<String>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockVcs {
    /// Clean working copy at `head`; `head` also resolves to itself
    pub fn new(head: &str) -> Self {
        let mut revisions = HashMap::new();
        revisions.insert(head.to_string(), head.to_string());
        revisions.insert("HEAD".to_string(), head.to_string());
        Self {
            versioned: true,
            head: head.to_string(),
            dirty: false,
            revisions,
            fail_with: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Folder without version control
    pub fn unversioned() -> Self {
        Self {
            versioned: false,
            ..Self::new("")
        }
    }

    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    /// Make `name` resolve to `commit`
    pub fn with_revision(mut self, name: &str, commit: &str) -> Self {
        self.revisions.insert(name.to_string(), commit.to_string());
        self
    }

    /// Every query after `is_versioned` fails with `message`
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Calls made so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: &'static str) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        match &self.fail_with {
            Some(message) if call != "is_versioned" => Err(DatasetError::version_control(message.clone())),
            _ => Ok(()),
        }
    }
}

impl VersionControl for MockVcs {
    fn is_versioned(&self, _folder: &Path) -> Result<bool> {
        self.record("is_versioned")?;
        Ok(self.versioned)
    }

    fn head(&self, _folder: &Path) -> Result<String> {
        self.record("head")?;
        Ok(self.head.clone())
    }

    fn resolve(&self, _folder: &Path, revision: &str) -> Result<Option<String>> {
        self.record("resolve")?;
        Ok(self.revisions.get(revision).cloned())
    }

    fn is_dirty(&self, _folder: &Path) -> Result<bool> {
        self.record("is_dirty")?;
        Ok(self.dirty)
    }
}

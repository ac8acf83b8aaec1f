//! SubjectId - Cheap-to-clone participant identifier
//!
//! Uses Arc<str> internally for O(1) clone operations.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Participant identifier with cheap cloning.
///
/// Subject ids are the names of the folders below `<root>/data/` (e.g. `"54a9"`).
/// They are discovered once and then copied into every metadata record, trial
/// and error message, so cloning only bumps a reference count.
///
/// # Examples
/// ```
/// use contracts::SubjectId;
///
/// let id: SubjectId = "54a9".into();
/// let id2 = id.clone();  // O(1) - just increments ref count
/// assert_eq!(id, id2);
/// assert_eq!(id.as_str(), "54a9");
/// ```
#[derive(Clone, Default)]
pub struct SubjectId(Arc<str>);

impl SubjectId {
    /// Create a new SubjectId from a string slice.
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    /// Get the underlying string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Deref to &str for easy string operations
impl Deref for SubjectId {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for SubjectId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SubjectId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Conversions
impl From<&str> for SubjectId {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SubjectId {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<Arc<str>> for SubjectId {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

// Display and Debug
impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({:?})", self.0)
    }
}

// Equality - can compare with &str, String, etc.
impl PartialEq for SubjectId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        // Fast path: same Arc pointer
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for SubjectId {}

impl PartialEq<str> for SubjectId {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for SubjectId {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialEq<String> for SubjectId {
    #[inline]
    fn eq(&self, other: &String) -> bool {
        self.0.as_ref() == other
    }
}

// Hash - same as str hash for HashMap compatibility
impl Hash for SubjectId {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

// Ordering - lexicographic, so subject sets iterate in folder-listing order
impl PartialOrd for SubjectId {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SubjectId {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

// Serde support
impl Serialize for SubjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SubjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_clone_is_cheap() {
        let id1: SubjectId = "4d91".into();
        let id2 = id1.clone();

        // Both should point to same underlying data (Arc clone is O(1))
        assert_eq!(id1.as_str().as_ptr(), id2.as_str().as_ptr());
    }

    #[test]
    fn test_equality() {
        let id: SubjectId = "cb3d".into();
        assert_eq!(id, "cb3d");
        assert_eq!(id, String::from("cb3d"));
        assert_eq!(id, SubjectId::from("cb3d"));
    }

    #[test]
    fn test_hashmap_key() {
        let mut map: HashMap<SubjectId, i32> = HashMap::new();
        map.insert("54a9".into(), 1);
        map.insert("6dbe".into(), 2);

        // Can lookup with &str
        assert_eq!(map.get("54a9"), Some(&1));
        assert_eq!(map.get("6dbe"), Some(&2));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids: Vec<SubjectId> = vec!["cb3d".into(), "4d91".into(), "54a9".into()];
        ids.sort();
        let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(names, ["4d91", "54a9", "cb3d"]);
    }

    #[test]
    fn test_serde() {
        let id: SubjectId = "54a9".into();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"54a9\"");

        let parsed: SubjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}

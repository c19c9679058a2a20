//! Registry data model.
//!
//! A registry maps library names to their known versions, each carrying a
//! content fingerprint and a modification timestamp:
//!
//! ```json
//! {
//!   "bem-core": {
//!     "v2": { "sha": "a1b2c3", "date": 1423729520000 }
//!   }
//! }
//! ```
//!
//! Both levels keep document order, which is the traversal order used by
//! the reconciler.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Content state of a single library version.
///
/// Fields are optional only so that malformed documents can be represented
/// and compared; a well-formed record always has both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Content fingerprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    /// Modification timestamp, milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
}

impl VersionRecord {
    /// Create a well-formed record.
    pub fn new(sha: impl Into<String>, date: i64) -> Self {
        VersionRecord {
            sha: Some(sha.into()),
            date: Some(date),
        }
    }

    /// Whether two records describe the same content.
    ///
    /// Both `sha` and `date` must be present and equal. A missing field never
    /// matches anything, including another missing field, so a malformed
    /// record is always reported as changed.
    pub fn same_content(&self, other: &VersionRecord) -> bool {
        match (&self.sha, &other.sha, self.date, other.date) {
            (Some(a_sha), Some(b_sha), Some(a_date), Some(b_date)) => {
                a_sha == b_sha && a_date == b_date
            }
            _ => false,
        }
    }
}

/// All known versions of one library, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryEntry {
    versions: IndexMap<String, VersionRecord>,
}

impl LibraryEntry {
    /// Look up a version record.
    pub fn get(&self, version: &str) -> Option<&VersionRecord> {
        self.versions.get(version)
    }

    /// Check whether a version is known.
    pub fn contains(&self, version: &str) -> bool {
        self.versions.contains_key(version)
    }

    /// Insert or replace a version record, keeping the original position
    /// when replacing.
    pub fn insert(&mut self, version: impl Into<String>, record: VersionRecord) {
        self.versions.insert(version.into(), record);
    }

    /// Remove a version, preserving the order of the remaining ones.
    pub fn remove(&mut self, version: &str) -> Option<VersionRecord> {
        self.versions.shift_remove(version)
    }

    /// Iterate versions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionRecord)> {
        self.versions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// A full registry snapshot: library name → versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    libraries: IndexMap<String, LibraryEntry>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a registry from JSON bytes and check its structure.
    pub fn from_json_bytes(data: &[u8]) -> Result<Self> {
        let registry: Registry = serde_json::from_slice(data)?;
        registry.validate()?;
        Ok(registry)
    }

    /// Parse a registry from a JSON string and check its structure.
    #[cfg(test)]
    pub fn from_json_str(s: &str) -> Result<Self> {
        Self::from_json_bytes(s.as_bytes())
    }

    /// Serialize as pretty-printed JSON, preserving insertion order.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject names that cannot be used as a single cache path component.
    ///
    /// Library and version names become directories under the cache, so
    /// each must be non-empty, not `.` or `..`, free of path separators and
    /// not absolute.
    pub fn validate(&self) -> Result<()> {
        for (lib, entry) in &self.libraries {
            if let Some(reason) = invalid_name_reason(lib) {
                return Err(RegistryError::InvalidRegistry {
                    detail: format!("library name '{lib}' {reason}"),
                });
            }
            for (version, _) in entry.iter() {
                if let Some(reason) = invalid_name_reason(version) {
                    return Err(RegistryError::InvalidRegistry {
                        detail: format!("version name '{version}' in library '{lib}' {reason}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up a library entry.
    pub fn library(&self, name: &str) -> Option<&LibraryEntry> {
        self.libraries.get(name)
    }

    /// Look up a single version record.
    pub fn version(&self, lib: &str, version: &str) -> Option<&VersionRecord> {
        self.libraries.get(lib).and_then(|entry| entry.get(version))
    }

    /// Check whether a (library, version) pair is known.
    pub fn contains(&self, lib: &str, version: &str) -> bool {
        self.version(lib, version).is_some()
    }

    /// Insert or replace a version record, creating the library if needed.
    pub fn insert(
        &mut self,
        lib: impl Into<String>,
        version: impl Into<String>,
        record: VersionRecord,
    ) {
        self.libraries
            .entry(lib.into())
            .or_default()
            .insert(version, record);
    }

    /// Remove a whole library.
    pub fn remove_library(&mut self, lib: &str) -> Option<LibraryEntry> {
        self.libraries.shift_remove(lib)
    }

    /// Remove a single version. The library entry stays even if it becomes
    /// empty.
    pub fn remove_version(&mut self, lib: &str, version: &str) -> Option<VersionRecord> {
        self.libraries.get_mut(lib).and_then(|entry| entry.remove(version))
    }

    /// Iterate libraries in insertion order.
    pub fn libraries(&self) -> impl Iterator<Item = (&str, &LibraryEntry)> {
        self.libraries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of libraries.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Total number of (library, version) pairs.
    pub fn version_count(&self) -> usize {
        self.libraries.values().map(LibraryEntry::len).sum()
    }
}

/// Why `name` is not a usable path component, if it is not.
fn invalid_name_reason(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("is empty")
    } else if name == "." || name == ".." {
        Some("is a relative path component")
    } else if name.contains('/') || name.contains('\\') {
        Some("contains a path separator")
    } else if Path::new(name).is_absolute() {
        Some("is an absolute path")
    } else {
        None
    }
}

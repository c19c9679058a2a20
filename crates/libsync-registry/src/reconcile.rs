//! Registry reconciliation.
//!
//! Compares the previously cached registry (`local`) against the
//! authoritative one (`remote`) and classifies every (library, version) pair:
//!
//! - present only in `remote` → **added**
//! - present in both, record differs → **modified**
//! - present only in `local` → **removed**
//!
//! Added and modified entries follow `remote` order; removed entries follow
//! `local` order. Order is part of the result, not an accident of iteration.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::changes::ChangeTracker;
use crate::registry::Registry;

/// One affected (library, version) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub lib: String,
    pub version: String,
}

impl ChangeEntry {
    pub fn new(lib: impl Into<String>, version: impl Into<String>) -> Self {
        ChangeEntry {
            lib: lib.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.lib, self.version)
    }
}

/// Result of comparing two registries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<ChangeEntry>,
    pub modified: Vec<ChangeEntry>,
    pub removed: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    /// Entries whose data has to be fetched: added first, then modified.
    pub fn to_fetch(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.added.iter().chain(self.modified.iter())
    }
}

/// Compute the changes needed to bring `local` in line with `remote`.
pub fn reconcile(local: &Registry, remote: &Registry) -> ChangeSet {
    let mut changes = ChangeSet::default();

    for (lib, remote_entry) in remote.libraries() {
        let local_entry = local.library(lib);
        for (version, remote_record) in remote_entry.iter() {
            match local_entry.and_then(|entry| entry.get(version)) {
                None => {
                    debug!(lib, version, "version added");
                    changes.added.push(ChangeEntry::new(lib, version));
                }
                Some(local_record) if !local_record.same_content(remote_record) => {
                    debug!(lib, version, "version modified");
                    changes.modified.push(ChangeEntry::new(lib, version));
                }
                Some(_) => {}
            }
        }
    }

    for (lib, local_entry) in local.libraries() {
        let remote_entry = remote.library(lib);
        for (version, _) in local_entry.iter() {
            if !remote_entry.is_some_and(|entry| entry.contains(version)) {
                debug!(lib, version, "version removed");
                changes.removed.push(ChangeEntry::new(lib, version));
            }
        }
    }

    changes
}

/// Reconcile and append the result to `tracker`.
///
/// Buckets are appended in the order added, modified, removed. The returned
/// change set is the same one recorded in the tracker.
pub fn reconcile_into(
    local: &Registry,
    remote: &Registry,
    tracker: &mut ChangeTracker,
) -> ChangeSet {
    let changes = reconcile(local, remote);
    info!(
        added = changes.added.len(),
        modified = changes.modified.len(),
        removed = changes.removed.len(),
        "registry reconciled"
    );

    tracker.add_added(changes.added.iter().cloned());
    tracker.add_modified(changes.modified.iter().cloned());
    tracker.add_removed(changes.removed.iter().cloned());

    changes
}

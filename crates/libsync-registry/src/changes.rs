//! Run-scoped change accumulator.
//!
//! Page generation later in the pipeline reads which library pages need to
//! be built or dropped. Every reconciliation pass appends to the same
//! tracker; nothing here removes or rewrites an entry.

use serde::{Deserialize, Serialize};

use crate::reconcile::ChangeEntry;

/// Page-level change buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageChanges {
    pub added: Vec<ChangeEntry>,
    pub modified: Vec<ChangeEntry>,
    pub removed: Vec<ChangeEntry>,
}

impl PageChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len()
    }
}

/// Accumulates changes for a single pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeTracker {
    pages: PageChanges,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated page changes.
    pub fn pages(&self) -> &PageChanges {
        &self.pages
    }

    pub fn add_added(&mut self, entries: impl IntoIterator<Item = ChangeEntry>) {
        self.pages.added.extend(entries);
    }

    pub fn add_modified(&mut self, entries: impl IntoIterator<Item = ChangeEntry>) {
        self.pages.modified.extend(entries);
    }

    pub fn add_removed(&mut self, entries: impl IntoIterator<Item = ChangeEntry>) {
        self.pages.removed.extend(entries);
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Serialize as pretty-printed JSON for downstream steps.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

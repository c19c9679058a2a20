//! One synchronization pass.
//!
//! Loads the cached registry, fetches the remote one, reconciles them into
//! the run's change tracker, persists the remote registry as the new cache,
//! and fetches data for every added or modified version.

use tracing::{info, warn};

use crate::cache::{self, CacheLayout};
use crate::changes::ChangeTracker;
use crate::error::{RegistryError, Result};
use crate::reconcile::{reconcile_into, ChangeEntry, ChangeSet};
use crate::remote::{RemoteStore, VERSION_DATA_FILE};

/// A version whose data could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    pub entry: ChangeEntry,
    pub error: RegistryError,
}

/// Outcome of a sync pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Changes computed for this pass.
    pub changes: ChangeSet,
    /// Versions whose data was written to the cache.
    pub fetched: Vec<ChangeEntry>,
    /// Versions whose data could not be fetched or written.
    pub failed: Vec<FetchFailure>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Synchronizes one cache layout against one remote store.
pub struct SyncTask<'a> {
    layout: CacheLayout,
    store: &'a dyn RemoteStore,
}

impl<'a> SyncTask<'a> {
    pub fn new(layout: CacheLayout, store: &'a dyn RemoteStore) -> Self {
        SyncTask { layout, store }
    }

    /// Run a full pass, appending this pass's changes to `tracker`.
    ///
    /// Failing to read or parse either registry, or to save the new cache,
    /// aborts the pass. Per-version fetch failures do not; they are listed
    /// in the report.
    pub fn run(&self, tracker: &mut ChangeTracker) -> Result<SyncReport> {
        let registry_path = self.layout.registry_file();
        let local = cache::load(&registry_path)?;
        let remote = self.store.fetch_registry()?;

        let changes = reconcile_into(&local, &remote, tracker);
        cache::save(&registry_path, &remote)?;

        let mut report = SyncReport {
            changes,
            ..Default::default()
        };

        let pending: Vec<ChangeEntry> = report.changes.to_fetch().cloned().collect();
        for entry in pending {
            match self.fetch_version(&entry) {
                Ok(()) => report.fetched.push(entry),
                Err(error) => {
                    warn!(
                        lib = %entry.lib,
                        version = %entry.version,
                        %error,
                        "failed to fetch library version"
                    );
                    report.failed.push(FetchFailure { entry, error });
                }
            }
        }

        info!(
            fetched = report.fetched.len(),
            failed = report.failed.len(),
            removed = report.changes.removed.len(),
            "library sync finished"
        );
        Ok(report)
    }

    /// Fetch one version's data into `<segment>/<lib>/<version>/`.
    fn fetch_version(&self, entry: &ChangeEntry) -> Result<()> {
        let data = self.store.fetch_version_data(&entry.lib, &entry.version)?;

        let dir = self.layout.lib_version_dir(&entry.lib, &entry.version);
        std::fs::create_dir_all(&dir).map_err(|e| RegistryError::CacheError {
            path: dir.clone(),
            detail: format!("creating version dir: {e}"),
        })?;

        let path = dir.join(VERSION_DATA_FILE);
        std::fs::write(&path, data).map_err(|e| RegistryError::CacheError {
            path,
            detail: format!("writing version data: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::registry::{Registry, VersionRecord};

    /// In-memory store that records which keys were read.
    #[derive(Default)]
    struct MemoryStore {
        objects: HashMap<String, Vec<u8>>,
        reads: RefCell<Vec<String>>,
    }

    impl MemoryStore {
        fn with_registry(registry: &Registry) -> Self {
            let mut store = MemoryStore::default();
            store.objects.insert(
                "registry.json".to_string(),
                registry.to_json_pretty().unwrap().into_bytes(),
            );
            store
        }

        fn put(&mut self, key: &str, data: &[u8]) {
            self.objects.insert(key.to_string(), data.to_vec());
        }
    }

    impl RemoteStore for MemoryStore {
        fn read(&self, key: &str) -> Result<Vec<u8>> {
            self.reads.borrow_mut().push(key.to_string());
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| RegistryError::Remote {
                    key: key.to_string(),
                    detail: "no such key".to_string(),
                })
        }
    }

    #[test]
    fn first_run_fetches_everything() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf(), Some("/libraries"));

        let mut remote = Registry::new();
        remote.insert("bem-core", "v2", VersionRecord::new("a", 1));
        remote.insert("bem-bl", "dev", VersionRecord::new("b", 2));
        let mut store = MemoryStore::with_registry(&remote);
        store.put("bem-core/v2/storage.data.json", b"core");
        store.put("bem-bl/dev/storage.data.json", b"bl");

        let mut tracker = ChangeTracker::new();
        let report = SyncTask::new(layout.clone(), &store).run(&mut tracker).unwrap();

        assert!(report.is_complete());
        assert_eq!(report.fetched.len(), 2);
        assert_eq!(tracker.pages().added.len(), 2);
        assert_eq!(
            std::fs::read(layout.lib_version_dir("bem-core", "v2").join("storage.data.json"))
                .unwrap(),
            b"core"
        );
        assert_eq!(cache::load(&layout.registry_file()).unwrap(), remote);
    }

    #[test]
    fn unchanged_run_fetches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf(), None);

        let mut remote = Registry::new();
        remote.insert("bem-core", "v2", VersionRecord::new("a", 1));
        cache::save(&layout.registry_file(), &remote).unwrap();
        let store = MemoryStore::with_registry(&remote);

        let mut tracker = ChangeTracker::new();
        let report = SyncTask::new(layout, &store).run(&mut tracker).unwrap();

        assert!(report.changes.is_empty());
        assert!(tracker.is_empty());
        assert_eq!(*store.reads.borrow(), vec!["registry.json".to_string()]);
    }

    #[test]
    fn fetch_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf(), None);

        let mut remote = Registry::new();
        remote.insert("present", "v1", VersionRecord::new("a", 1));
        remote.insert("missing", "v1", VersionRecord::new("b", 1));
        let mut store = MemoryStore::with_registry(&remote);
        store.put("present/v1/storage.data.json", b"ok");

        let mut tracker = ChangeTracker::new();
        let report = SyncTask::new(layout, &store).run(&mut tracker).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.fetched, vec![ChangeEntry::new("present", "v1")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].entry, ChangeEntry::new("missing", "v1"));
        // The version is still reported as added.
        assert_eq!(tracker.pages().added.len(), 2);
    }

    #[test]
    fn remote_registry_failure_aborts_before_saving() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf(), None);
        let store = MemoryStore::default();

        let mut tracker = ChangeTracker::new();
        let result = SyncTask::new(layout.clone(), &store).run(&mut tracker);

        assert!(matches!(result, Err(RegistryError::Remote { .. })));
        assert!(!layout.registry_file().exists());
        assert!(tracker.is_empty());
    }

    #[test]
    fn corrupt_local_cache_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().to_path_buf(), None);
        std::fs::create_dir_all(layout.libraries_dir()).unwrap();
        std::fs::write(layout.registry_file(), b"{ broken").unwrap();

        let store = MemoryStore::with_registry(&Registry::new());
        let mut tracker = ChangeTracker::new();
        let result = SyncTask::new(layout, &store).run(&mut tracker);

        assert!(matches!(result, Err(RegistryError::Json(_))));
    }

    #[test]
    fn traversal_names_never_leave_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path().join("cache"), None);

        let mut store = MemoryStore::default();
        store.put(
            "registry.json",
            br#"{ "..": { "escaped": { "sha": "a", "date": 1 } } }"#,
        );
        store.put("../escaped/storage.data.json", b"outside");

        let mut tracker = ChangeTracker::new();
        let result = SyncTask::new(layout.clone(), &store).run(&mut tracker);

        assert!(matches!(result, Err(RegistryError::InvalidRegistry { .. })));
        assert!(tracker.is_empty());
        assert!(!dir.path().join("cache/escaped").exists());
        assert!(!layout.registry_file().exists());
        // Only the registry document was read.
        assert_eq!(*store.reads.borrow(), vec!["registry.json".to_string()]);
    }
}

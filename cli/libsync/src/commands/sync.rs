//! `libsync sync` — synchronize the library cache with the remote store.

use std::path::Path;

use anyhow::{bail, Context, Result};
use libsync_registry::{CacheLayout, ChangeTracker, DirStore, HttpStore, RemoteStore, SyncTask};

use crate::manifest::LibsyncManifest;

/// Run one sync pass.
///
/// Reads from `mirror` instead of the configured remote store when given.
/// Writes the accumulated change tracker as JSON to `changes_out` when given.
pub fn run(
    project_dir: &Path,
    manifest: &LibsyncManifest,
    mirror: Option<&Path>,
    changes_out: Option<&Path>,
) -> Result<()> {
    let config = manifest.sync_config().validate()?;
    let layout = CacheLayout::new(manifest.cache_root(project_dir), config.base_url.as_deref());

    let store: Box<dyn RemoteStore> = match mirror {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("mirror directory {} does not exist", dir.display());
            }
            Box::new(DirStore::new(dir.to_path_buf()))
        }
        None => Box::new(HttpStore::new(&config.remote_store)?),
    };

    let mut tracker = ChangeTracker::new();
    let report = SyncTask::new(layout.clone(), store.as_ref())
        .run(&mut tracker)
        .context("library sync failed")?;

    println!(
        "Synchronized {}: {} added, {} modified, {} removed",
        layout.libraries_dir().display(),
        report.changes.added.len(),
        report.changes.modified.len(),
        report.changes.removed.len(),
    );
    for entry in &report.changes.added {
        println!("  + {entry}");
    }
    for entry in &report.changes.modified {
        println!("  ~ {entry}");
    }
    for entry in &report.changes.removed {
        println!("  - {entry}");
    }

    if let Some(path) = changes_out {
        let json = tracker.to_json_pretty()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote changes to {}", path.display());
    }

    if !report.is_complete() {
        for failure in &report.failed {
            eprintln!("  failed to fetch {}: {}", failure.entry, failure.error);
        }
        bail!("{} library version(s) could not be fetched", report.failed.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsync_registry::{Registry, VersionRecord};

    fn manifest() -> LibsyncManifest {
        LibsyncManifest::from_str(
            "[sync]\nbase_url = \"/libraries\"\n\n[remote_store]\nnamespace = \"mysite\"\n",
        )
        .unwrap()
    }

    fn write_mirror(root: &Path) {
        let mut registry = Registry::new();
        registry.insert("bem-core", "v2", VersionRecord::new("abc", 1));
        std::fs::create_dir_all(root.join("bem-core/v2")).unwrap();
        std::fs::write(root.join("registry.json"), registry.to_json_pretty().unwrap()).unwrap();
        std::fs::write(root.join("bem-core/v2/storage.data.json"), b"{}").unwrap();
    }

    #[test]
    fn sync_from_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let mirror = dir.path().join("mirror");
        write_mirror(&mirror);
        let changes = dir.path().join("changes.json");

        run(dir.path(), &manifest(), Some(&mirror), Some(&changes)).unwrap();

        assert!(dir
            .path()
            .join(".builder/cache/libraries/registry.json")
            .is_file());
        assert!(dir
            .path()
            .join(".builder/cache/libraries/bem-core/v2/storage.data.json")
            .is_file());

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&changes).unwrap()).unwrap();
        assert_eq!(written["pages"]["added"][0]["lib"], "bem-core");
    }

    #[test]
    fn sync_rejects_missing_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = LibsyncManifest::from_str("[remote_store]\nhost = \"x\"\n").unwrap();

        let err = run(dir.path(), &manifest, None, None).unwrap_err();
        assert!(err.to_string().contains("namespace"));
        assert!(!dir.path().join(".builder").exists());
    }

    #[test]
    fn sync_rejects_missing_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(run(dir.path(), &manifest(), Some(&missing), None).is_err());
    }
}

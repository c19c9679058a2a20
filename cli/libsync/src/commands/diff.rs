//! `libsync diff` — compare two registry files without touching the cache.

use std::path::Path;

use anyhow::{Context, Result};
use libsync_registry::{reconcile, ChangeSet, Registry};

/// Reconcile `local` against `remote` and print the change set.
///
/// A missing `local` file is treated as an empty registry, the same way the
/// sync task treats a cache miss.
pub fn run(local: &Path, remote: &Path, json: bool) -> Result<()> {
    let changes = diff_files(local, remote)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print!("{}", format_changes(&changes));
    }
    Ok(())
}

fn diff_files(local: &Path, remote: &Path) -> Result<ChangeSet> {
    let local_registry = libsync_registry::load(local)
        .with_context(|| format!("loading {}", local.display()))?;
    let data = std::fs::read(remote).with_context(|| format!("reading {}", remote.display()))?;
    let remote_registry = Registry::from_json_bytes(&data)
        .with_context(|| format!("parsing {}", remote.display()))?;

    Ok(reconcile(&local_registry, &remote_registry))
}

/// Human-readable change listing.
fn format_changes(changes: &ChangeSet) -> String {
    if changes.is_empty() {
        return "No changes.\n".to_string();
    }

    let mut out = String::new();
    for (label, bucket) in [
        ("Added", &changes.added),
        ("Modified", &changes.modified),
        ("Removed", &changes.removed),
    ] {
        if bucket.is_empty() {
            continue;
        }
        out.push_str(&format!("{label} ({}):\n", bucket.len()));
        for entry in bucket {
            out.push_str(&format!("  {} {}\n", entry.lib, entry.version));
        }
    }
    out
}

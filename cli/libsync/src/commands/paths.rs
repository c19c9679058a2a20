//! `libsync paths` — show where the cache lives.

use std::path::Path;

use anyhow::{bail, Result};
use libsync_registry::CacheLayout;

use crate::manifest::LibsyncManifest;

/// Print the resolved cache locations, optionally for one library version.
pub fn run(
    project_dir: &Path,
    manifest: &LibsyncManifest,
    lib: Option<&str>,
    version: Option<&str>,
) -> Result<()> {
    let layout = CacheLayout::new(
        manifest.cache_root(project_dir),
        manifest.sync.base_url.as_deref(),
    );

    match (lib, version) {
        (Some(lib), Some(version)) => {
            println!("{}", layout.lib_version_dir(lib, version).display());
        }
        (None, None) => {
            println!("cache root: {}", layout.root().display());
            println!("libraries:  {}", layout.libraries_dir().display());
            println!("registry:   {}", layout.registry_file().display());
        }
        _ => bail!("--lib and --version must be given together"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lib_without_version_is_rejected() {
        let manifest = LibsyncManifest::default();
        assert!(run(Path::new("/site"), &manifest, Some("bem-core"), None).is_err());
    }

    #[test]
    fn prints_layout() {
        let manifest = LibsyncManifest::default();
        run(Path::new("/site"), &manifest, None, None).unwrap();
        run(Path::new("/site"), &manifest, Some("bem-core"), Some("v2")).unwrap();
    }
}

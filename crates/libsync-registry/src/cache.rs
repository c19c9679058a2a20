//! Local registry cache.
//!
//! The registry file and the per-version data live under a directory derived
//! from the site's base URL.
//!
//! Layout:
//! ```text
//! <cache_root>/
//!   <segment>/              — "libs", or last segment of the base URL
//!     registry.json         — Last synchronized remote registry
//!     <library>/
//!       <version>/
//!         storage.data.json — Version data fetched from the remote store
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// Segment used when no base URL is configured.
pub const DEFAULT_SEGMENT: &str = "libs";

/// File name of the cached registry.
pub const REGISTRY_FILE: &str = "registry.json";

/// Resolved on-disk locations for one cache root and base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    /// Root directory for the build cache.
    root: PathBuf,
    /// Directory name derived from the base URL.
    segment: String,
}

impl CacheLayout {
    /// Create a layout for the given cache root and optional base URL.
    pub fn new(root: PathBuf, base_url: Option<&str>) -> Self {
        CacheLayout {
            root,
            segment: segment_for(base_url),
        }
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the base-URL-derived directory name.
    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// `<root>/<segment>`
    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join(&self.segment)
    }

    /// `<root>/<segment>/registry.json`
    pub fn registry_file(&self) -> PathBuf {
        self.libraries_dir().join(REGISTRY_FILE)
    }

    /// `<root>/<segment>/<lib>/<version>`
    pub fn lib_version_dir(&self, lib: &str, version: &str) -> PathBuf {
        self.libraries_dir().join(lib).join(version)
    }
}

/// Derive the cache directory name from a base URL.
///
/// Takes the last non-empty path segment, so `/libraries` and
/// `/docs/libraries/` both map to `libraries`.
pub fn segment_for(base_url: Option<&str>) -> String {
    base_url
        .and_then(|url| url.split('/').filter(|s| !s.is_empty()).last())
        .unwrap_or(DEFAULT_SEGMENT)
        .to_string()
}

/// Load a registry from the cache.
///
/// A missing file is a cache miss and yields an empty registry. Anything
/// unreadable or malformed at an existing path is an error.
pub fn load(path: &Path) -> Result<Registry> {
    if !path.exists() {
        warn!(path = %path.display(), "registry cache not found, starting from empty registry");
        return Ok(Registry::new());
    }

    let data = std::fs::read(path).map_err(|e| RegistryError::CacheError {
        path: path.to_path_buf(),
        detail: format!("reading registry: {e}"),
    })?;
    let registry = Registry::from_json_bytes(&data)?;
    debug!(
        path = %path.display(),
        libraries = registry.len(),
        versions = registry.version_count(),
        "loaded registry cache"
    );
    Ok(registry)
}

/// Persist a registry to the cache.
///
/// The document is written to a temporary file next to `path` and renamed
/// over it, so readers never observe a partial file.
pub fn save(path: &Path, registry: &Registry) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| RegistryError::CacheError {
        path: dir.clone(),
        detail: format!("creating cache dir: {e}"),
    })?;

    let json = registry.to_json_pretty()?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| RegistryError::CacheError {
        path: dir.clone(),
        detail: format!("creating temporary file: {e}"),
    })?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| RegistryError::CacheError {
            path: tmp.path().to_path_buf(),
            detail: format!("writing registry: {e}"),
        })?;
    tmp.persist(path).map_err(|e| RegistryError::CacheError {
        path: path.to_path_buf(),
        detail: format!("replacing registry: {}", e.error),
    })?;

    debug!(path = %path.display(), libraries = registry.len(), "saved registry cache");
    Ok(())
}

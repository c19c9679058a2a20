//! `libsync.toml` parsing and project configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use libsync_registry::{RemoteStoreOptions, SyncConfig};

/// File name searched for by `find_and_load`.
pub const MANIFEST_FILE: &str = "libsync.toml";

/// The top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibsyncManifest {
    /// Local cache settings.
    #[serde(default)]
    pub sync: SyncSection,
    /// Remote store connection.
    #[serde(default)]
    pub remote_store: Option<RemoteStoreOptions>,
}

/// `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    /// Build cache directory, relative to the manifest directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Base URL of the library pages.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for SyncSection {
    fn default() -> Self {
        SyncSection {
            cache_dir: default_cache_dir(),
            base_url: None,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".builder/cache")
}

impl LibsyncManifest {
    /// Search upward from `start_dir` for a `libsync.toml` file, parse and
    /// return it along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let manifest = Self::load(&candidate)?;
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Load a manifest from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing libsync.toml")
    }

    /// Sync task configuration, not yet validated.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            base_url: self.sync.base_url.clone(),
            remote_store: self.remote_store.clone(),
        }
    }

    /// Cache root resolved against the manifest directory.
    pub fn cache_root(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.sync.cache_dir)
    }
}

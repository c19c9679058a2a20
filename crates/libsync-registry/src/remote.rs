//! Remote store trait and implementations.
//!
//! The `RemoteStore` trait abstracts the object store holding the
//! authoritative registry. `HttpStore` talks to the storage service over
//! HTTP; `DirStore` reads the same keys from a local mirror directory, for
//! offline runs and testing.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use tracing::debug;

use crate::config::RemoteStoreConfig;
use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// Key of the registry document in the remote store.
pub const REGISTRY_KEY: &str = "registry.json";

/// File name of per-version data, both remotely and in the cache.
pub const VERSION_DATA_FILE: &str = "storage.data.json";

/// Key of the data document for one library version.
pub fn version_data_key(lib: &str, version: &str) -> String {
    format!("{lib}/{version}/{VERSION_DATA_FILE}")
}

/// Abstract remote object store.
pub trait RemoteStore {
    /// Read the raw contents stored under `key`.
    fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Fetch and parse the remote registry.
    fn fetch_registry(&self) -> Result<Registry> {
        let data = self.read(REGISTRY_KEY)?;
        let registry = Registry::from_json_bytes(&data)?;
        debug!(
            libraries = registry.len(),
            versions = registry.version_count(),
            "fetched remote registry"
        );
        Ok(registry)
    }

    /// Fetch the data document for one library version.
    fn fetch_version_data(&self, lib: &str, version: &str) -> Result<Vec<u8>> {
        self.read(&version_data_key(lib, version))
    }
}

/// HTTP client for the storage service.
///
/// Keys are read from `http://<host>:<port>/get-<namespace>/<key>`, with
/// every key segment percent-encoded.
pub struct HttpStore {
    client: reqwest::blocking::Client,
    base: Url,
}

impl HttpStore {
    /// Create a client for the given store.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("libsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Config {
                detail: format!("creating HTTP client: {e}"),
            })?;

        let mut base = Url::parse(&format!("http://{}:{}/", config.host, config.port))
            .map_err(|e| RegistryError::Config {
                detail: format!(
                    "invalid remote store address '{}:{}': {e}",
                    config.host, config.port
                ),
            })?;
        base.path_segments_mut()
            .map_err(|()| RegistryError::Config {
                detail: format!("remote store address '{}' cannot carry a path", config.host),
            })?
            .pop_if_empty()
            .push(&format!("get-{}", config.namespace));

        Ok(HttpStore { client, base })
    }

    /// URL a key is read from.
    pub fn url_for(&self, key: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RegistryError::Remote {
                key: key.to_string(),
                detail: format!("base URL {} cannot carry a path", self.base),
            })?
            .extend(key.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

impl RemoteStore for HttpStore {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.url_for(key)?;
        debug!(%url, "reading from remote store");

        let response = self.client.get(url).send().map_err(|e| RegistryError::Remote {
            key: key.to_string(),
            detail: format!("request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Remote {
                key: key.to_string(),
                detail: format!("HTTP {status}"),
            });
        }

        let body = response.bytes().map_err(|e| RegistryError::Remote {
            key: key.to_string(),
            detail: format!("reading body: {e}"),
        })?;
        Ok(body.to_vec())
    }
}

/// A local directory laid out like the remote store.
///
/// Layout:
/// ```text
/// <root>/
///   registry.json
///   <library>/
///     <version>/
///       storage.data.json
/// ```
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        DirStore { root }
    }
}

impl RemoteStore for DirStore {
    fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(key);
        if !path.is_file() {
            return Err(RegistryError::Remote {
                key: key.to_string(),
                detail: format!("not found in {}", self.root.display()),
            });
        }
        Ok(std::fs::read(&path)?)
    }
}

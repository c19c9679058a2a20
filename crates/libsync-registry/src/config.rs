//! Sync task configuration.
//!
//! The raw form mirrors what a user writes; `validate` turns it into a
//! `ValidatedConfig` with defaults applied, or fails before any I/O happens.

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Default remote store host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default remote store port.
pub const DEFAULT_PORT: u16 = 80;

/// Remote store options as written in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStoreOptions {
    /// Storage namespace (required).
    #[serde(default)]
    pub namespace: Option<String>,
    /// Storage host.
    #[serde(default)]
    pub host: Option<String>,
    /// Storage port.
    #[serde(default)]
    pub port: Option<u16>,
}

/// Raw sync task configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the library pages; selects the cache segment.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Remote store connection options.
    #[serde(default)]
    pub remote_store: Option<RemoteStoreOptions>,
}

/// Remote store connection with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStoreConfig {
    pub namespace: String,
    pub host: String,
    pub port: u16,
}

/// Configuration that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    pub base_url: Option<String>,
    pub remote_store: RemoteStoreConfig,
}

impl SyncConfig {
    /// Check required options and fill in defaults.
    pub fn validate(&self) -> Result<ValidatedConfig> {
        let options = self.remote_store.as_ref().ok_or_else(|| RegistryError::Config {
            detail: "remote store options were not set in task configuration".to_string(),
        })?;

        let namespace = options
            .namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| RegistryError::Config {
                detail: "remote store \"namespace\" property was not set in task configuration"
                    .to_string(),
            })?;

        Ok(ValidatedConfig {
            base_url: self.base_url.clone(),
            remote_store: RemoteStoreConfig {
                namespace: namespace.to_string(),
                host: options
                    .host
                    .clone()
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: options.port.unwrap_or(DEFAULT_PORT),
            },
        })
    }
}

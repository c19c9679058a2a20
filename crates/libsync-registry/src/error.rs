//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur during registry synchronization.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Task configuration is incomplete. Raised before any I/O.
    #[error("{detail}")]
    Config { detail: String },

    /// Registry document is structurally invalid.
    #[error("invalid registry: {detail}")]
    InvalidRegistry { detail: String },

    /// Cache I/O error.
    #[error("cache error at {path}: {detail}")]
    CacheError { path: PathBuf, detail: String },

    /// Remote store read failure.
    #[error("remote store error for '{key}': {detail}")]
    Remote { key: String, detail: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

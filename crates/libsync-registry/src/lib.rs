//! Library registry synchronization for the site build pipeline.
//!
//! Keeps a local cache of a library registry in line with a remote registry
//! kept in an object store, and reports which library versions were added,
//! modified, or removed since the previous pass.
//!
//! # Architecture
//!
//! - **Registry** — library → version → `{sha, date}` model with JSON I/O
//! - **Cache** — on-disk layout and atomic load/save of the registry file
//! - **Reconcile** — diff of two registry snapshots into a change set
//! - **Changes** — run-scoped accumulator consumed by page generation
//! - **Remote** — object store boundary (HTTP and directory mirror)
//! - **Sync** — one full pass: load, fetch, reconcile, persist, fetch data
//!
//! The reconciler is a pure function over borrowed snapshots; everything with
//! side effects lives in `cache`, `remote` and `sync`.

pub mod cache;
pub mod changes;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod registry;
pub mod remote;
pub mod sync;

// Re-exports for convenience.
pub use cache::{load, save, CacheLayout};
pub use changes::{ChangeTracker, PageChanges};
pub use config::{RemoteStoreConfig, RemoteStoreOptions, SyncConfig, ValidatedConfig};
pub use error::{RegistryError, Result};
pub use reconcile::{reconcile, reconcile_into, ChangeEntry, ChangeSet};
pub use registry::{LibraryEntry, Registry, VersionRecord};
pub use remote::{DirStore, HttpStore, RemoteStore};
pub use sync::{SyncReport, SyncTask};

//! Preference storage.
//!
//! A small async key-value seam used for the stored language and the stored
//! ad consent. Backends:
//! 1. Platform keyring (if `keyring-storage` feature enabled and available)
//! 2. JSON file in the scanlet config directory
//! 3. In-process memory (tests, ephemeral hosts)
//!
//! Stores are non-transactional and shared: other parts of the host may read
//! the same keys at any time.

mod file;
#[cfg(feature = "keyring-storage")]
mod keychain;
mod memory;

pub use file::FileStore;
#[cfg(feature = "keyring-storage")]
pub use keychain::KeyringStore;
pub use memory::MemoryStore;

use crate::error::StorageError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Async key-value store for user preferences.
pub trait PreferenceStore: Send + Sync {
    /// Read a value, `None` if the key was never written.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>>;

    /// Write a value, replacing any previous one.
    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Delete a value. Deleting a missing key is not an error.
    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Human-readable location of the data (for diagnostics).
    fn describe(&self) -> String;
}

/// Which backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    Keyring,
    File,
    Memory,
}

impl StorageBackend {
    /// The backend [`open_store`] actually opens in this build.
    pub fn effective(self) -> StorageBackend {
        match self {
            #[cfg(not(feature = "keyring-storage"))]
            StorageBackend::Keyring => StorageBackend::File,
            other => other,
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Keyring => write!(f, "keyring"),
            StorageBackend::File => write!(f, "file"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyring" => Ok(StorageBackend::Keyring),
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Open the requested backend rooted at `config_dir`.
///
/// Without the `keyring-storage` feature a keyring request is served by the
/// file store.
pub fn open_store(backend: StorageBackend, config_dir: &Path) -> Arc<dyn PreferenceStore> {
    match backend {
        #[cfg(feature = "keyring-storage")]
        StorageBackend::Keyring => Arc::new(KeyringStore::new(FileStore::in_dir(config_dir))),
        #[cfg(not(feature = "keyring-storage"))]
        StorageBackend::Keyring => {
            tracing::debug!("Keyring support not compiled in, using file storage");
            Arc::new(FileStore::in_dir(config_dir))
        }
        StorageBackend::File => Arc::new(FileStore::in_dir(config_dir)),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    }
}

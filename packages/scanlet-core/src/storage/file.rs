//! File-based preference storage (always available).
//!
//! All preferences live in one JSON object in `preferences.json` inside the
//! scanlet config directory. Writes are read-modify-write under an in-process
//! lock; other processes writing the same file at the same time can lose an
//! update, which is acceptable for user preferences.

use super::PreferenceStore;
use crate::error::StorageError;
use futures::future::{BoxFuture, FutureExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Store rooted in a config directory.
    pub fn in_dir(config_dir: &Path) -> Self {
        Self::new(config_dir.join(PREFERENCES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(values) => Ok(values),
            Err(e) => {
                // A corrupt file must not wedge every later read; start over.
                tracing::warn!("Ignoring unreadable preferences file {:?}: {}", self.path, e);
                Ok(BTreeMap::new())
            }
        }
    }

    async fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(values)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_private(&path, json.as_bytes()))
            .await
            .map_err(|e| StorageError::Unavailable(format!("preference writer panicked: {}", e)))??;

        tracing::debug!("Preferences saved to file: {:?}", self.path);
        Ok(())
    }

    async fn update(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut values = self.read_all().await?;
        f(&mut values);
        self.write_all(&values).await
    }
}

/// Write `bytes` to `path`, owner read/write only on Unix.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(bytes)?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, bytes)?;
    }

    Ok(())
}

impl PreferenceStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move { Ok(self.read_all().await?.remove(key)) }.boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.update(|values| {
                values.insert(key.to_string(), value.to_string());
            })
            .await
        }
        .boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            if !self.path.exists() {
                return Ok(());
            }
            self.update(|values| {
                values.remove(key);
            })
            .await
        }
        .boxed()
    }

    fn describe(&self) -> String {
        format!("File-based storage: {}", self.path.display())
    }
}

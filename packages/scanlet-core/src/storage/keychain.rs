//! Keyring-backed preference storage with a file fallback.
//!
//! Each preference is its own keyring entry (`service = "scanlet"`,
//! `user = <key>`). When the platform keychain is unavailable (headless Linux
//! without a secret service, locked keychain) reads and writes go to the
//! [`FileStore`] instead.

use super::{FileStore, PreferenceStore};
use crate::error::StorageError;
use futures::future::{BoxFuture, FutureExt};
use keyring::Entry;

/// Service name used for keyring storage
const KEYRING_SERVICE: &str = "scanlet";

#[derive(Debug)]
pub struct KeyringStore {
    fallback: FileStore,
}

impl KeyringStore {
    pub fn new(fallback: FileStore) -> Self {
        Self { fallback }
    }
}

fn get_keyring_entry(key: &str) -> Result<Entry, StorageError> {
    tracing::trace!(
        "Creating keyring entry for service='{}', user='{}'",
        KEYRING_SERVICE,
        key
    );

    Entry::new(KEYRING_SERVICE, key).map_err(|e| StorageError::Keyring(e.to_string()))
}

/// Keyring calls block on D-Bus/Security.framework; keep them off the runtime.
async fn blocking<T, F>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Unavailable(format!("keyring task failed: {}", e)))?
}

impl PreferenceStore for KeyringStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        async move {
            let owned = key.to_string();
            let result = blocking(move || {
                let entry = get_keyring_entry(&owned)?;
                match entry.get_password() {
                    Ok(value) => Ok(Some(value)),
                    Err(keyring::Error::NoEntry) => Ok(None),
                    Err(e) => Err(StorageError::Keyring(e.to_string())),
                }
            })
            .await;

            match result {
                Ok(Some(value)) => {
                    tracing::debug!("Preference '{}' loaded from keyring", key);
                    Ok(Some(value))
                }
                Ok(None) => {
                    tracing::debug!("No '{}' in keyring, trying file fallback", key);
                    self.fallback.get(key).await
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to read '{}' from keyring: {}, trying file fallback",
                        key,
                        e
                    );
                    self.fallback.get(key).await
                }
            }
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let owned_key = key.to_string();
            let owned_value = value.to_string();
            let result = blocking(move || {
                get_keyring_entry(&owned_key)?
                    .set_password(&owned_value)
                    .map_err(|e| StorageError::Keyring(e.to_string()))
            })
            .await;

            match result {
                Ok(()) => {
                    // Drop any copy left by an earlier fallback write.
                    if let Err(e) = self.fallback.remove(key).await {
                        tracing::debug!("Failed to clear file fallback for '{}': {}", key, e);
                    }
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to save '{}' to keyring: {}, using file storage",
                        key,
                        e
                    );
                    self.fallback.set(key, value).await
                }
            }
        }
        .boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            // Always delete from file as well
            self.fallback.remove(key).await?;

            let owned = key.to_string();
            blocking(move || match get_keyring_entry(&owned)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(StorageError::Keyring(e.to_string())),
            })
            .await
        }
        .boxed()
    }

    fn describe(&self) -> String {
        #[cfg(target_os = "windows")]
        let platform = "Windows Credential Manager";
        #[cfg(target_os = "macos")]
        let platform = "macOS Keychain";
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        let platform = "Secret Service (GNOME Keyring/KWallet)";

        format!("{} (with file fallback: {})", platform, self.fallback.path().display())
    }
}

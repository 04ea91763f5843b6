use super::PreferenceStore;
use crate::error::StorageError;
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Mutex;

/// Preferences held in process memory. Lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_values<T>(&self, f: impl FnOnce(&mut HashMap<String, String>) -> T) -> Result<T, StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store poisoned".to_string()))?;
        Ok(f(&mut values))
    }
}

impl PreferenceStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, StorageError>> {
        future::ready(self.with_values(|v| v.get(key).cloned())).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        future::ready(self.with_values(|v| {
            v.insert(key.to_string(), value.to_string());
        }))
        .boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        future::ready(self.with_values(|v| {
            v.remove(key);
        }))
        .boxed()
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

//! Whole-value key/value storage persisted as a single JSON file.
//!
//! Each key holds one JSON document serialized to a string, the same way a
//! browser's local storage would. Reads treat a missing file, a corrupt file
//! or an undecodable value as "no data". Writes replace the file atomically
//! and are serialized within this process; separate processes sharing the
//! file get last-writer-wins.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::error::StoreError;

pub const SAVED_KEY: &str = "cc_saved";
pub const PROFILE_KEY: &str = "cc_profile";

/// Key for `key` inside one device's namespace.
pub fn device_key(device: &str, key: &str) -> String {
    format!("{device}:{key}")
}

#[derive(Clone)]
pub struct LocalStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl LocalStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: Arc::new(path.as_ref().to_path_buf()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn read_all(&self) -> BTreeMap<String, String> {
        let raw = match tokio::fs::read_to_string(self.path.as_ref()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "local store unreadable");
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "local store corrupt, ignoring");
            BTreeMap::new()
        })
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, self.path.as_ref()).await?;
        Ok(())
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.read_all().await;
        let raw = entries.get(key)?;
        match serde_json::from_str(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "discarding undecodable local value");
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(value)?;
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await;
        entries.insert(key.to_string(), encoded);
        self.write_all(&entries).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await;
        if entries.remove(key).is_some() {
            self.write_all(&entries).await?;
        }
        Ok(())
    }

    /// Read-modify-write of one key under the write lock. A missing or
    /// undecodable value is handed to `f` as `T::default()`.
    pub async fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> Result<R, StoreError>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_all().await;
        let mut value: T = entries
            .get(key)
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();
        let out = f(&mut value);
        entries.insert(key.to_string(), serde_json::to_string(&value)?);
        self.write_all(&entries).await?;
        Ok(out)
    }
}

//! Key-value storage backends for the session

use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

use crate::{Result, SessionError};

/// Key holding the opaque bearer token
pub const USER_TOKEN_KEY: &str = "userToken";

/// Key holding the JSON-serialized profile snapshot
pub const USER_INFO_KEY: &str = "userInfo";

/// Device-local, string keyed storage consumed by the session layer
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Write several values, all or nothing.
    ///
    /// The default writes in order and, when a write fails, removes the keys
    /// it already wrote before returning the error.
    async fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (written, (key, value)) in entries.iter().enumerate() {
            if let Err(err) = self.set(key, value).await {
                warn!("Failed to write {}, rolling back {} keys", key, written);
                for (key, _) in &entries[..written] {
                    if let Err(err) = self.remove(key).await {
                        warn!("Rollback of {} failed: {}", key, err);
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Remove several values.
    ///
    /// The default removes one key at a time; backends that can apply the
    /// removal in a single write should override it.
    async fn remove_all(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// In-process store, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn set_all(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut map = self.entries.write().await;
        for (key, value) in entries {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Store backed by a single JSON object file.
///
/// Every mutation rewrites the whole file through a sibling temp file and a
/// rename, so readers only ever see a complete document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("Session file {} not found, starting empty", self.path.display());
                Ok(HashMap::new())
            }
            Err(err) => Err(SessionError::Io(err)),
        }
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let body = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, body).await?;
        if let Err(err) = tokio::fs::rename(&tmp, &self.path).await {
            warn!("Failed to move session file into place: {}", err);
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(SessionError::Io(err));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_all(&[(key, value)]).await
    }

    async fn set_all(&self, values: &[(&str, &str)]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        for (key, value) in values {
            entries.insert(key.to_string(), value.to_string());
        }
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.remove_all(&[key]).await
    }

    async fn remove_all(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.persist(&entries).await
    }
}

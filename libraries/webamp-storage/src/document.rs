//! JSON document store
//!
//! One JSON file per key under a data directory. Reads of a missing file
//! yield the type's default; a file that fails to parse is logged and also
//! read as the default, so one corrupt document never locks the user out.
//! Writes go to a temporary file first and are renamed into place.
//!
//! Read-modify-write cycles run under a store-wide lock.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key of the playlist collection
pub const PLAYLISTS_KEY: &str = "web-amp-playlists";

/// Key of the usage statistics document
pub const USAGE_KEY: &str = "web-amp-usage-data";

/// Key of the application settings document
pub const SETTINGS_KEY: &str = "web-amp-settings";

/// Directory-backed document store
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl DocumentStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!("Opened document store at {}", dir.display());

        Ok(Self {
            dir,
            lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a document, falling back to its default
    pub async fn load<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let _guard = self.lock.lock().await;
        self.read(key).await
    }

    /// Replace a document
    pub async fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write(key, value).await
    }

    /// Read, modify and write back a document atomically with respect to
    /// other callers of this store
    ///
    /// The document is only written when `apply` returns `Some`.
    pub async fn update<T, R>(
        &self,
        key: &str,
        apply: impl FnOnce(&mut T) -> Option<R>,
    ) -> Result<Option<R>>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        let _guard = self.lock.lock().await;

        let mut document: T = self.read(key).await?;
        let outcome = apply(&mut document);
        if outcome.is_some() {
            self.write(key, &document).await?;
        }
        Ok(outcome)
    }

    /// Delete a document; missing documents are fine
    pub async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().await;

        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    async fn read<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let bytes = match tokio::fs::read(self.path(key)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!("Failed to parse {} document: {}", key, e);
                Ok(T::default())
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        let path = self.path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

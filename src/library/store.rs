//! Key-value blob stores backing the library.
//!
//! The library persists one JSON blob under one key. `FileBlobStore` maps
//! each key to `{dir}/{key}.json`; `MemoryBlobStore` keeps blobs in a map
//! for tests and dry runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Store is closed")]
    Closed,
}

/// Async key-value storage for string blobs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Release the store. Later operations fail with `StoreError::Closed`.
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// One JSON file per key inside a directory.
pub struct FileBlobStore {
    dir: PathBuf,
    closed: RwLock<bool>,
}

impl FileBlobStore {
    /// Open (creating if needed) the store directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StoreError::Io {
                action: "create store dir",
                path: dir.display().to_string(),
                source,
            })?;
        log::info!("[LIBRARY] Opened store at {}", dir.display());
        Ok(Self {
            dir,
            closed: RwLock::new(false),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path to a key's file.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    async fn ensure_open(&self) -> Result<(), StoreError> {
        if *self.closed.read().await {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.ensure_open().await?;
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                action: "read",
                path: path.display().to_string(),
                source,
            }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_open().await?;
        let path = self.path_for(key);
        // Write a sibling file and rename so a crash never leaves half a blob.
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        let io_err = |action: &'static str, source: std::io::Error| StoreError::Io {
            action,
            path: path.display().to_string(),
            source,
        };
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_err("write", e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_err("replace", e))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.ensure_open().await?;
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                action: "delete",
                path: path.display().to_string(),
                source,
            }),
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        *self.closed.write().await = true;
        log::info!("[LIBRARY] Closed store at {}", self.dir.display());
        Ok(())
    }
}

/// In-memory store. Blobs live in a `HashMap` behind a [`RwLock`].
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
    closed: RwLock<bool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate blobs; handy for seeding corrupt or legacy data in tests.
    pub fn with_blobs(blobs: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>) -> Self {
        Self {
            blobs: RwLock::new(
                blobs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            closed: RwLock::new(false),
        }
    }

    async fn ensure_open(&self) -> Result<(), StoreError> {
        if *self.closed.read().await {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.ensure_open().await?;
        Ok(self.blobs.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.ensure_open().await?;
        self.blobs
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.ensure_open().await?;
        self.blobs.write().await.remove(key);
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        *self.closed.write().await = true;
        Ok(())
    }
}

//! Snapshot Storage Module
//!
//! Durable key-value primitive the persistence layer writes through.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{MediaError, Result};

// == Snapshot Storage Trait ==
/// Durable byte storage addressed by key.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Reads the bytes stored under `key`, or None if nothing is stored.
    async fn read_snapshot(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replaces the bytes stored under `key`.
    async fn write_snapshot(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Removes `key`. Removing a missing key succeeds.
    async fn delete_snapshot(&self, key: &str) -> Result<()>;
}

// == File Storage ==
/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileSnapshotStorage {
    dir: PathBuf,
}

impl FileSnapshotStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(|c: char| c == '/' || c == '\\') || key.starts_with('.') {
            return Err(MediaError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SnapshotStorage for FileSnapshotStorage {
    async fn read_snapshot(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_snapshot(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        // Write beside the target and rename so readers never see a torn file
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete_snapshot(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

// == Memory Storage ==
/// Process-local storage, for tests and runs without a snapshot directory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStorage {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates `key`, e.g. with a snapshot from an earlier run.
    pub fn with_snapshot(key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        let storage = Self::new();
        storage.slots.lock().insert(key.to_string(), bytes.into());
        storage
    }

    /// Current bytes under `key`.
    pub fn contents(&self, key: &str) -> Option<Vec<u8>> {
        self.slots.lock().get(key).cloned()
    }
}

#[async_trait]
impl SnapshotStorage for MemorySnapshotStorage {
    async fn read_snapshot(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.slots.lock().get(key).cloned())
    }

    async fn write_snapshot(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.slots.lock().insert(key.to_string(), bytes);
        Ok(())
    }

    async fn delete_snapshot(&self, key: &str) -> Result<()> {
        self.slots.lock().remove(key);
        Ok(())
    }
}

use std::{io::ErrorKind, path::PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::errors::StorageError;

/// File-backed stand-in for browser `localStorage`.
///
/// Every key maps to `<root>/<key>.json` holding one JSON blob. Keys are
/// restricted to `[A-Za-z0-9_.-]` and may not start with a dot, so a key can
/// never name a path outside the root.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open (and create if needed) the storage directory.
    pub async fn new<P: Into<PathBuf>>(root: P) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|source| StorageError::Io {
            key: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    /// Raw blob for a key; `None` when the key was never written.
    pub async fn get_item(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }

    /// Replace the blob for a key. Written to a sibling temp file first and
    /// renamed over the target so readers never see a torn blob.
    pub async fn set_item(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StorageError::Io { key: key.to_string(), source };
        fs::write(&tmp, data).await.map_err(io_err)?;
        fs::rename(&tmp, &path).await.map_err(io_err)?;
        Ok(())
    }

    /// Remove a key; returns whether it existed.
    pub async fn remove_item(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }

    /// All keys currently present, sorted.
    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let io_err = |source| StorageError::Io { key: self.root.display().to_string(), source };
        let mut entries = fs::read_dir(&self.root).await.map_err(io_err)?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(key) = name.strip_suffix(".json") {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Decode the blob for a key as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StorageError::Serde { key: key.to_string(), source }),
            None => Ok(None),
        }
    }

    /// Encode a value as JSON and store it under a key.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let data = serde_json::to_vec(value)
            .map_err(|source| StorageError::Serde { key: key.to_string(), source })?;
        self.set_item(key, &data).await
    }
}

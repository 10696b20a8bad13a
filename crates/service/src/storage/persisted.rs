use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::LocalStorage;
use crate::errors::StorageError;

/// Version written into every envelope. Blobs with another version are
/// discarded at rehydration.
pub const STATE_VERSION: u32 = 0;

#[derive(Serialize)]
struct EnvelopeRef<'a, S> {
    state: &'a S,
    version: u32,
}

#[derive(Deserialize)]
struct Envelope<S> {
    state: S,
    #[serde(default)]
    version: u32,
}

/// One store's whole state, mirrored to a single storage key.
///
/// Rehydrates at `open` and rewrites the full `{"state": .., "version": ..}`
/// envelope after every mutation. The write lock is held through the write,
/// so the blob on disk always matches the last completed mutation.
pub struct PersistedState<S> {
    inner: Arc<RwLock<S>>,
    storage: LocalStorage,
    key: String,
}

impl<S> PersistedState<S>
where
    S: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Load the state under `key`, falling back to `S::default()` when the
    /// blob is missing, unreadable or from another version.
    pub async fn open(storage: LocalStorage, key: impl Into<String>) -> Result<Self, StorageError> {
        let key = key.into();
        let state = match storage.get_item(&key).await? {
            Some(bytes) => match serde_json::from_slice::<Envelope<S>>(&bytes) {
                Ok(env) if env.version == STATE_VERSION => env.state,
                Ok(env) => {
                    warn!(%key, found = env.version, expected = STATE_VERSION, "state version mismatch; starting fresh");
                    S::default()
                }
                Err(e) => {
                    warn!(%key, error = %e, "unreadable persisted state; starting fresh");
                    S::default()
                }
            },
            None => {
                let fresh = S::default();
                write_envelope(&storage, &key, &fresh).await?;
                fresh
            }
        };
        Ok(Self { inner: Arc::new(RwLock::new(state)), storage, key })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run a read-only closure against the current state.
    pub async fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self.inner.read().await;
        f(&state)
    }

    /// Clone of the current state.
    pub async fn snapshot(&self) -> S {
        self.inner.read().await.clone()
    }

    /// Apply a mutation and persist the whole state.
    ///
    /// The in-memory change stands even if the write fails; the write error
    /// is still returned to the caller.
    pub async fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> Result<R, StorageError> {
        let mut state = self.inner.write().await;
        let out = f(&mut state);
        write_envelope(&self.storage, &self.key, &*state).await?;
        debug!(key = %self.key, "state persisted");
        Ok(out)
    }

    /// Replace the whole state and persist it.
    pub async fn replace(&self, next: S) -> Result<(), StorageError> {
        self.update(|s| *s = next).await
    }
}

async fn write_envelope<S: Serialize>(storage: &LocalStorage, key: &str, state: &S) -> Result<(), StorageError> {
    let env = EnvelopeRef { state, version: STATE_VERSION };
    storage.set_json(key, &env).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default, Serialize, Deserialize, PartialEq, Debug)]
    struct Counter {
        hits: u32,
        names: Vec<String>,
    }

    async fn temp_storage() -> LocalStorage {
        let dir = std::env::temp_dir().join(format!("persisted_{}", uuid::Uuid::new_v4()));
        LocalStorage::new(dir).await.expect("storage init")
    }

    #[tokio::test]
    async fn update_persists_and_rehydrates() -> Result<(), anyhow::Error> {
        let storage = temp_storage().await;
        let state = PersistedState::<Counter>::open(storage.clone(), "counter").await?;
        // missing blob is written out immediately
        assert!(storage.get_item("counter").await?.is_some());

        let hits = state
            .update(|s| {
                s.hits += 2;
                s.names.push("a".into());
                s.hits
            })
            .await?;
        assert_eq!(hits, 2);

        let reopened = PersistedState::<Counter>::open(storage.clone(), "counter").await?;
        assert_eq!(reopened.snapshot().await, Counter { hits: 2, names: vec!["a".into()] });

        let raw: serde_json::Value = storage.get_json("counter").await?.unwrap();
        assert_eq!(raw["version"], 0);
        assert_eq!(raw["state"]["hits"], 2);

        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }

    #[tokio::test]
    async fn garbage_or_foreign_version_falls_back_to_default() -> Result<(), anyhow::Error> {
        let storage = temp_storage().await;
        storage.set_item("counter", b"{oops").await?;
        let state = PersistedState::<Counter>::open(storage.clone(), "counter").await?;
        assert_eq!(state.snapshot().await, Counter::default());

        storage
            .set_json("counter", &serde_json::json!({"state": {"hits": 9, "names": []}, "version": 7}))
            .await?;
        let state = PersistedState::<Counter>::open(storage.clone(), "counter").await?;
        assert_eq!(state.read(|s| s.hits).await, 0);

        let _ = tokio::fs::remove_dir_all(storage.root()).await;
        Ok(())
    }
}

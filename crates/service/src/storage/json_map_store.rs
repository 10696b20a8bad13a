use std::{collections::HashMap, hash::Hash, sync::Arc};

use super::{LocalStorage, PersistedState};
use crate::errors::ServiceError;

/// Generic key-value map persisted under one local storage key.
///
/// Thin CRUD layer over `PersistedState<HashMap<K, V>>` for tables where
/// the whole map is small enough to rewrite on every change.
pub struct JsonMapStore<K, V> {
    state: PersistedState<HashMap<K, V>>,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone + Send + Sync,
{
    /// Open the map stored under `key`, creating an empty one if missing.
    pub async fn open(storage: LocalStorage, key: &str) -> Result<Arc<Self>, ServiceError> {
        let state = PersistedState::open(storage, key).await?;
        Ok(Arc::new(Self { state }))
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.state.read(|map| map.len()).await
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.state.read(|map| map.get(key).cloned()).await
    }

    /// Insert or update a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        self.state.update(|map| { map.insert(key, value); }).await?;
        Ok(())
    }

    /// Apply a fallible mutation to the underlying map and persist.
    ///
    /// When the closure fails the map is still persisted as the closure left it,
    /// so closures should check before they mutate.
    pub async fn update_map<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, ServiceError>,
    {
        self.state.update(f).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_map_store_crud_persists() -> Result<(), anyhow::Error> {
        let dir = std::env::temp_dir().join(format!("json_map_store_{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&dir).await?;
        let store = JsonMapStore::<String, String>::open(storage.clone(), "accounts").await?;
        assert_eq!(store.len().await, 0);

        store.insert("a".into(), "1".into()).await?;
        store.insert("b".into(), "2".into()).await?;
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));
        assert_eq!(store.len().await, 2);

        store
            .update_map(|m| {
                if let Some(v) = m.get_mut(&"a".to_string()) { *v = "10".into(); }
                m.remove("b");
                Ok(())
            })
            .await?;
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("10"));

        let missing = store
            .update_map(|m| m.get("zzz").cloned().ok_or_else(|| ServiceError::not_found("entry")))
            .await;
        assert!(matches!(missing, Err(ServiceError::NotFound(_))));

        // reload from disk
        let reloaded = JsonMapStore::<String, String>::open(storage, "accounts").await?;
        assert_eq!(reloaded.len().await, 1);
        assert_eq!(reloaded.get(&"a".into()).await.as_deref(), Some("10"));
        assert!(reloaded.get(&"b".into()).await.is_none());

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}

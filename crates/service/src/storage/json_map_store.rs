use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::{fs, sync::RwLock};
use tracing::warn;

use super::SessionStorage;
use crate::errors::ClientError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file. Every mutation rewrites the
/// whole file, so a multi-key update is one write. The file is written to a
/// sibling temp path first and renamed into place.
#[derive(Clone)]
pub struct JsonMapStore<K, V> {
    inner: Arc<RwLock<HashMap<K, V>>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Initialize the store from a path. Creates the file with an empty map if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ClientError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %file_path.display(), error = %e, "session file unreadable, starting empty");
                HashMap::new()
            }),
            Err(_) => {
                let empty: HashMap<K, V> = HashMap::new();
                write_file(&file_path, &empty).await?;
                empty
            }
        };

        Ok(Arc::new(Self { inner: Arc::new(RwLock::new(map)), file_path }))
    }

    /// Get value by key.
    pub async fn get_value(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// Apply a mutation to the underlying map and persist atomically.
    /// If persisting fails the in-memory map is rolled back.
    pub async fn update_map<F>(&self, f: F) -> Result<(), ClientError>
    where
        F: FnOnce(&mut HashMap<K, V>),
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        f(&mut next);
        write_file(&self.file_path, &next).await?;
        *map = next;
        Ok(())
    }
}

async fn write_file<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), ClientError> {
    let data = serde_json::to_vec(value).map_err(|e| ClientError::Storage(e.to_string()))?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).await.map_err(|e| ClientError::Storage(e.to_string()))?;
    fs::rename(&tmp, path).await.map_err(|e| ClientError::Storage(e.to_string()))?;
    Ok(())
}

#[async_trait]
impl SessionStorage for JsonMapStore<String, String> {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.get_value(&key.to_string()).await)
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), ClientError> {
        self.update_map(|m| m.extend(entries)).await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        self.update_map(|m| {
            for key in keys {
                m.remove(*key);
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_map_store_persists_across_reloads() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_{}.json", uuid::Uuid::new_v4()));
        let store = JsonMapStore::<String, String>::new(&tmp).await?;

        assert_eq!(store.get("token").await?, None);

        store.set_many(vec![("token".into(), "abc".into()), ("user".into(), "{}".into())]).await?;
        assert_eq!(store.get("token").await?.as_deref(), Some("abc"));

        store.remove_many(&["user"]).await?;
        let reloaded = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(reloaded.get("token").await?.as_deref(), Some("abc"));
        assert_eq!(reloaded.get("user").await?, None);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("json_map_store_{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&tmp, b"not json").await?;
        let store = JsonMapStore::<String, String>::new(&tmp).await?;
        assert_eq!(store.get("token").await?, None);
        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}

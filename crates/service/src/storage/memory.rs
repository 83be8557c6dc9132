use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::SessionStorage;
use crate::errors::ClientError;

/// In-process storage; every client built with it starts anonymous.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.inner.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.inner.read().await.is_empty() }
}

#[async_trait]
impl SessionStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), ClientError> {
        let mut map = self.inner.write().await;
        map.extend(entries);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError> {
        let mut map = self.inner.write().await;
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

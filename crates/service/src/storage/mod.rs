//! Durable storage for the client session.
//!
//! The token store only needs a tiny string key-value surface. Two
//! implementations ship: a JSON file (survives restarts) and process memory.

use async_trait::async_trait;

use crate::errors::ClientError;

pub mod json_map_store;
pub mod memory;

pub use json_map_store::JsonMapStore;
pub use memory::MemoryStorage;

/// Trait abstraction for session persistence.
/// Multi-key writes must land together or not at all.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ClientError>;
    async fn set_many(&self, entries: Vec<(String, String)>) -> Result<(), ClientError>;
    async fn remove_many(&self, keys: &[&str]) -> Result<(), ClientError>;
}

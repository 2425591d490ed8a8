use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub mod file_storage;
pub mod memory_storage;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

/// Durable key/value storage holding one serialized blob per key
#[async_trait]
pub trait Storage: Send + Sync {
    /// Reads the blob stored under `key`, `None` when nothing was stored
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the blob stored under `key`
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the blob stored under `key`; removing a missing key succeeds
    async fn remove_item(&self, key: &str) -> Result<()>;
}

/// Shared handles let several stores (or a store and its host) use one
/// backend
#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    async fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<()> {
        (**self).remove_item(key).await
    }
}

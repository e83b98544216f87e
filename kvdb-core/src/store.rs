use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Capability interface of the node's key-value map.
///
/// Mutations return only after the change is durable. Reads never touch
/// storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Insert or overwrite `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`, returning whether it existed.
    async fn remove(&self, key: &str) -> Result<bool>;

    async fn get(&self, key: &str) -> Option<String>;

    async fn contains(&self, key: &str) -> bool;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key).await
    }

    async fn get(&self, key: &str) -> Option<String> {
        (**self).get(key).await
    }

    async fn contains(&self, key: &str) -> bool {
        (**self).contains(key).await
    }
}

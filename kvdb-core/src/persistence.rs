use crate::Result;
use async_trait::async_trait;

/// Storage backend for the durable snapshot of the key-value map.
///
/// The node persists exactly one value: the full current map, rewritten on
/// every mutation. Implementations only move opaque bytes; the record format
/// lives in [`crate::snapshot`].
#[async_trait]
pub trait PersistenceLayer: Send + Sync {
    /// Replace the stored snapshot.
    ///
    /// # Returns
    /// * `Ok(())` once the snapshot is durably stored
    /// * `Err(KvError)` if the write failed; the previous snapshot may or
    ///   may not still be readable depending on the implementation
    async fn save_state(&self, state: &[u8]) -> Result<()>;

    /// Load the stored snapshot.
    ///
    /// # Returns
    /// * `Ok(Some(state))` if a snapshot exists
    /// * `Ok(None)` if nothing was ever saved (first startup)
    /// * `Err(KvError)` if the snapshot exists but could not be read
    async fn load_state(&self) -> Result<Option<Vec<u8>>>;
}

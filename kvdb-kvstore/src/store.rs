//! # DurableStore Implementation
//!
//! The node's only piece of shared mutable state: an in-memory map mirrored
//! to a full snapshot after every mutation.

use async_trait::async_trait;
use kvdb_core::{persistence::PersistenceLayer, snapshot, KeyValueStore, Result};
use kvdb_persistence::FileSystemPersistence;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Configuration for a file-backed [`DurableStore`]
#[derive(Debug, Clone)]
pub struct DurableStoreConfig {
    /// Snapshot file
    pub db_file: PathBuf,
    /// Fsync each snapshot before it replaces the previous one
    pub sync_on_write: bool,
}

impl Default for DurableStoreConfig {
    fn default() -> Self {
        Self {
            db_file: PathBuf::from("kv.db"),
            sync_on_write: true,
        }
    }
}

impl DurableStoreConfig {
    pub fn new(db_file: impl Into<PathBuf>) -> Self {
        Self {
            db_file: db_file.into(),
            ..Default::default()
        }
    }

    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }
}

/// In-memory key-value map with synchronous whole-state persistence.
///
/// A single reader-writer lock guards the map. Mutations hold the write lock
/// until the snapshot rewrite has finished, so no reader ever observes a
/// mutation that is not yet on disk, and two rewrites never interleave.
/// Reads take the shared lock and never touch storage.
pub struct DurableStore<P: PersistenceLayer> {
    data: RwLock<BTreeMap<String, String>>,
    persistence: P,
}

impl DurableStore<FileSystemPersistence> {
    /// Open the snapshot file named by `config`, rebuilding the map from it.
    pub async fn open(config: DurableStoreConfig) -> Result<Self> {
        let persistence = FileSystemPersistence::new(&config.db_file)
            .await?
            .with_sync_on_write(config.sync_on_write);
        Self::load(persistence).await
    }
}

impl<P: PersistenceLayer> DurableStore<P> {
    /// Rebuild the map from whatever `persistence` holds.
    ///
    /// No snapshot yet means an empty store. Records without a `=` are
    /// skipped.
    pub async fn load(persistence: P) -> Result<Self> {
        let data = match persistence.load_state().await? {
            Some(bytes) => snapshot::decode(&bytes),
            None => BTreeMap::new(),
        };

        info!("DurableStore loaded with {} keys", data.len());
        Ok(Self {
            data: RwLock::new(data),
            persistence,
        })
    }

    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Copy of the whole map.
    pub async fn entries(&self) -> BTreeMap<String, String> {
        self.data.read().await.clone()
    }

    async fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let bytes = snapshot::encode(data);
        self.persistence.save_state(&bytes).await.map_err(|e| {
            error!("Snapshot rewrite failed, memory and disk may now disagree: {}", e);
            e
        })
    }
}

#[async_trait]
impl<P: PersistenceLayer> KeyValueStore for DurableStore<P> {
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), value.to_string());
        self.persist(&data).await?;

        debug!("SET operation: key={}, value_len={}", key, value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut data = self.data.write().await;
        let existed = data.remove(key).is_some();
        if existed {
            self.persist(&data).await?;
        }

        debug!("DELETE operation: key={}, existed={}", key, existed);
        Ok(existed)
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.data.read().await.get(key).cloned()
    }

    async fn contains(&self, key: &str) -> bool {
        self.data.read().await.contains_key(key)
    }
}

use async_trait::async_trait;
use kvdb_core::{persistence::PersistenceLayer, KvError, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Snapshot held in memory.
///
/// Suitable for tests and throwaway nodes. Clones share the same snapshot,
/// so a store rebuilt from a clone observes everything saved so far. Writes
/// can be made to fail to exercise the node-fatal persistence path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistence {
    state: Arc<RwLock<Option<Vec<u8>>>>,
    saves: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if loaded from disk.
    pub fn with_state(state: impl Into<Vec<u8>>) -> Self {
        let persistence = Self::new();
        *persistence.state.write() = Some(state.into());
        persistence
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }

    /// Make subsequent saves fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Current snapshot bytes.
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.state.read().clone()
    }
}

#[async_trait]
impl PersistenceLayer for InMemoryPersistence {
    async fn save_state(&self, state: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(KvError::persistence("injected write failure"));
        }
        *self.state.write() = Some(state.to_vec());
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    async fn load_state(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.state.read().clone())
    }
}

//! # Command Ingress
//!
//! Client-facing request logic, independent of the HTTP plumbing.
//!
//! Writes are forwarded verbatim to the consensus gateway and only become
//! visible once the sidecar calls back into [`crate::apply::ApplyService`].
//! Reads go straight to the local store and may therefore lag behind
//! proposals that are still in flight.

use bytes::Bytes;
use kvdb_core::{ConsensusGateway, KeyValueStore};
use std::fmt;
use tracing::debug;

/// Body returned for absent keys and for reads without a key.
pub const KEY_NOT_FOUND: &str = "Key Not Found";

/// Outcome of a client write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteReply {
    Ok,
    Error,
}

impl WriteReply {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteReply::Ok => "ok",
            WriteReply::Error => "error",
        }
    }
}

impl From<bool> for WriteReply {
    fn from(accepted: bool) -> Self {
        if accepted {
            WriteReply::Ok
        } else {
            WriteReply::Error
        }
    }
}

impl fmt::Display for WriteReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct CommandIngress<S, G> {
    store: S,
    gateway: G,
}

impl<S: KeyValueStore, G: ConsensusGateway> CommandIngress<S, G> {
    pub fn new(store: S, gateway: G) -> Self {
        Self { store, gateway }
    }

    /// Forward an encoded command for ordering.
    ///
    /// The command is neither decoded nor validated here. `Ok` means the
    /// sidecar accepted it, not that this node has applied it yet.
    pub async fn handle_write(&self, encoded_command: Bytes) -> WriteReply {
        let size = encoded_command.len();
        let reply = WriteReply::from(self.gateway.propose(encoded_command).await);
        debug!("Write of {} bytes: {}", size, reply);
        reply
    }

    /// Read a key from the local store.
    ///
    /// A missing key and a missing `key` parameter both yield
    /// [`KEY_NOT_FOUND`].
    pub async fn handle_read(&self, key: Option<&str>) -> String {
        let Some(key) = key else {
            debug!("Read without key parameter");
            return KEY_NOT_FOUND.to_string();
        };

        match self.store.get(key).await {
            Some(value) => value,
            None => KEY_NOT_FOUND.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kvdb_kvstore::DurableStore;
    use kvdb_persistence::InMemoryPersistence;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        accept: bool,
        proposals: Mutex<Vec<Bytes>>,
    }

    #[async_trait]
    impl ConsensusGateway for Recorder {
        async fn propose(&self, command: Bytes) -> bool {
            self.proposals.lock().unwrap().push(command);
            self.accept
        }
    }

    async fn ingress(accept: bool) -> CommandIngress<DurableStore<InMemoryPersistence>, Recorder> {
        let store = DurableStore::load(InMemoryPersistence::new()).await.unwrap();
        CommandIngress::new(
            store,
            Recorder {
                accept,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_write_forwards_bytes_verbatim() {
        let ingress = ingress(true).await;

        // Not a valid command; validation belongs to the state machine
        let raw = Bytes::from_static(b"\x00\x01garbage");
        assert_eq!(ingress.handle_write(raw.clone()).await, WriteReply::Ok);
        assert_eq!(*ingress.gateway.proposals.lock().unwrap(), vec![raw]);

        // Nothing is applied until the sidecar calls back
        assert!(ingress.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_write_reports_error() {
        let ingress = ingress(false).await;
        let reply = ingress.handle_write(Bytes::from_static(b"cmd")).await;
        assert_eq!(reply, WriteReply::Error);
        assert_eq!(reply.to_string(), "error");
    }

    #[tokio::test]
    async fn test_read_paths() {
        let ingress = ingress(true).await;
        ingress.store.set("user_1", "alice").await.unwrap();

        assert_eq!(ingress.handle_read(Some("user_1")).await, "alice");
        assert_eq!(ingress.handle_read(Some("missing")).await, KEY_NOT_FOUND);
        assert_eq!(ingress.handle_read(None).await, KEY_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stored_value_equal_to_marker_is_indistinguishable() {
        let ingress = ingress(true).await;
        ingress.store.set("k", KEY_NOT_FOUND).await.unwrap();
        assert_eq!(ingress.handle_read(Some("k")).await, KEY_NOT_FOUND);
    }
}

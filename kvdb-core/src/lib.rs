//! # kvdb Core - Replicated Key-Value State Machine
//!
//! Core components of a node in a Raft-backed key-value store. Consensus is
//! provided by an external sidecar; this crate defines what the node does
//! with the commands the sidecar orders.
//!
//! ## Components
//!
//! - **Command**: The `{op, key, value}` envelope and its validity rules
//! - **CommandCodec**: Field-tagged MessagePack encoding of commands
//! - **KvStateMachine**: Deterministic application of committed commands
//! - **Capability traits**: [`KeyValueStore`], [`ConsensusGateway`] and
//!   [`persistence::PersistenceLayer`], so services can run against fakes
//! - **Snapshot format**: The `key=value` text records backing the store
//! - **Error Handling**: [`KvError`] and its recovery classes
//!
//! ## Applying a command
//!
//! ```rust
//! use kvdb_core::{ApplyOutcome, Command, CommandCodec, KeyValueStore, KvStateMachine, Result};
//! use async_trait::async_trait;
//! use std::collections::HashMap;
//! use tokio::sync::RwLock;
//!
//! #[derive(Default)]
//! struct Scratch(RwLock<HashMap<String, String>>);
//!
//! #[async_trait]
//! impl KeyValueStore for Scratch {
//!     async fn set(&self, key: &str, value: &str) -> Result<()> {
//!         self.0.write().await.insert(key.into(), value.into());
//!         Ok(())
//!     }
//!     async fn remove(&self, key: &str) -> Result<bool> {
//!         Ok(self.0.write().await.remove(key).is_some())
//!     }
//!     async fn get(&self, key: &str) -> Option<String> {
//!         self.0.read().await.get(key).cloned()
//!     }
//!     async fn contains(&self, key: &str) -> bool {
//!         self.0.read().await.contains_key(key)
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bytes = CommandCodec.encode(&Command::set("user_1", "alice")).unwrap();
//! let command = CommandCodec.decode(&bytes).unwrap();
//!
//! let sm = KvStateMachine::new(Scratch::default());
//! assert_eq!(sm.apply(&command).await.unwrap(), ApplyOutcome::Applied);
//! assert_eq!(sm.store().get("user_1").await.as_deref(), Some("alice"));
//! # });
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod gateway;
pub mod persistence;
pub mod snapshot;
pub mod state_machine;
pub mod store;

pub use codec::{CommandCodec, MAX_COMMAND_BYTES, MSGPACK_CONTENT_TYPE};
pub use command::{Command, Operation};
pub use error::*;
pub use gateway::{ConsensusGateway, PROPOSE_DEADLINE};
pub use state_machine::{ApplyOutcome, KvStateMachine};
pub use store::KeyValueStore;

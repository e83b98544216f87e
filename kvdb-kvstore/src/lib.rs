//! # kvdb KVStore
//!
//! The durable key-value map behind a kvdb node.
//!
//! - Load-on-construct from the latest snapshot
//! - Whole-map snapshot rewrite on every mutation, finished before the
//!   mutation returns
//! - Single reader-writer lock: concurrent reads, exclusive mutations

pub mod store;

pub use store::{DurableStore, DurableStoreConfig};

/// Re-export commonly used types
pub use kvdb_core::KeyValueStore;

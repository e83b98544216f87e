//! # kvdb Persistence
//!
//! Snapshot storage backends for the kvdb node.
//!
//! Each backend stores exactly one value: the latest full snapshot of the
//! key-value map.
//!
//! ## Implementations
//!
//! - [`InMemoryPersistence`] - Snapshot held in memory (testing/non-persistent)
//! - [`FileSystemPersistence`] - Snapshot file replaced atomically on every save
//!
//! ## Example
//!
//! ```rust
//! use kvdb_persistence::{InMemoryPersistence, FileSystemPersistence};
//! use kvdb_core::persistence::PersistenceLayer;
//!
//! # tokio_test::block_on(async {
//! // In-memory persistence
//! let persistence = InMemoryPersistence::new();
//! persistence.save_state(b"user_1=alice\n").await.unwrap();
//! let state = persistence.load_state().await.unwrap();
//! assert_eq!(state, Some(b"user_1=alice\n".to_vec()));
//!
//! // File-based persistence
//! let dir = std::env::temp_dir().join("kvdb-doc-test");
//! let fs_persistence = FileSystemPersistence::new(dir.join("kv.db")).await.unwrap();
//! fs_persistence.save_state(b"user_1=alice\n").await.unwrap();
//! let state = fs_persistence.load_state().await.unwrap();
//! assert_eq!(state, Some(b"user_1=alice\n".to_vec()));
//! # });
//! ```

pub mod file_system;
pub mod in_memory;

pub use file_system::FileSystemPersistence;
pub use in_memory::InMemoryPersistence;

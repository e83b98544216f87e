use crate::{Command, KeyValueStore, KvError, Operation, Result};
use std::fmt;
use tracing::{debug, warn};

/// Logical result of applying one committed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The store reflects the command
    Applied,
    /// The command was not applied; the store is unchanged
    Rejected { reason: String },
}

impl ApplyOutcome {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Rejected { reason } => write!(f, "rejected: {}", reason),
        }
    }
}

/// Deterministic key-value state machine.
///
/// Each call performs at most one store mutation and nothing else: no
/// retries, no queuing. Invalid commands become [`ApplyOutcome::Rejected`];
/// only store failures surface as `Err`, and those are node-fatal.
#[derive(Debug, Clone)]
pub struct KvStateMachine<S> {
    store: S,
}

impl<S: KeyValueStore> KvStateMachine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn apply(&self, command: &Command) -> Result<ApplyOutcome> {
        if let Err(e) = command.validate() {
            return Ok(Self::reject(command, e));
        }

        match &command.operation {
            Operation::Set => {
                self.store.set(&command.key, &command.value).await?;
                debug!("Applied SET key={} value_len={}", command.key, command.value.len());
            }
            Operation::Delete => {
                let existed = self.store.remove(&command.key).await?;
                debug!("Applied DELETE key={} existed={}", command.key, existed);
            }
            Operation::Unknown(name) => {
                return Ok(Self::reject(command, KvError::unknown_operation(name.as_str())));
            }
        }

        Ok(ApplyOutcome::Applied)
    }

    fn reject(command: &Command, error: KvError) -> ApplyOutcome {
        match error {
            KvError::UnknownOperation { operation } => {
                warn!("Rejecting unknown operation {:?} for key {:?}", operation, command.key);
                ApplyOutcome::rejected("unknown operation")
            }
            other => {
                warn!("Rejecting {} command: {}", command.operation, other);
                ApplyOutcome::rejected(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MapStore {
        data: RwLock<HashMap<String, String>>,
    }

    #[async_trait]
    impl KeyValueStore for MapStore {
        async fn set(&self, key: &str, value: &str) -> Result<()> {
            self.data.write().await.insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn remove(&self, key: &str) -> Result<bool> {
            Ok(self.data.write().await.remove(key).is_some())
        }

        async fn get(&self, key: &str) -> Option<String> {
            self.data.read().await.get(key).cloned()
        }

        async fn contains(&self, key: &str) -> bool {
            self.data.read().await.contains_key(key)
        }
    }

    struct BrokenDisk;

    #[async_trait]
    impl KeyValueStore for BrokenDisk {
        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(KvError::persistence("disk unplugged"))
        }

        async fn remove(&self, _key: &str) -> Result<bool> {
            Err(KvError::persistence("disk unplugged"))
        }

        async fn get(&self, _key: &str) -> Option<String> {
            None
        }

        async fn contains(&self, _key: &str) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn test_set_and_delete() {
        let sm = KvStateMachine::new(MapStore::default());

        let outcome = sm.apply(&Command::set("user_1", "alice")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(sm.store().get("user_1").await, Some("alice".to_string()));

        let outcome = sm.apply(&Command::delete("user_1")).await.unwrap();
        assert!(outcome.is_applied());
        assert!(!sm.store().contains("user_1").await);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_applied() {
        let sm = KvStateMachine::new(MapStore::default());
        let outcome = sm.apply(&Command::delete("never_set")).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::Applied);
    }

    #[tokio::test]
    async fn test_unknown_operation_rejected() {
        let sm = KvStateMachine::new(MapStore::default());
        sm.apply(&Command::set("x", "1")).await.unwrap();

        let bump = Command::new(Operation::parse("BUMP"), "x", "");
        let outcome = sm.apply(&bump).await.unwrap();
        assert_eq!(outcome, ApplyOutcome::rejected("unknown operation"));
        assert_eq!(sm.store().get("x").await, Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_commands_leave_store_untouched() {
        let sm = KvStateMachine::new(MapStore::default());

        for command in [
            Command::set("", "v"),
            Command::set("a=b", "v"),
            Command::set("k", "multi\nline"),
        ] {
            let outcome = sm.apply(&command).await.unwrap();
            assert!(!outcome.is_applied(), "{:?} should be rejected", command);
        }
        assert!(sm.store().data.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_ordering_determines_final_state() {
        let sm = KvStateMachine::new(MapStore::default());
        for command in [
            Command::set("a", "1"),
            Command::set("a", "2"),
            Command::delete("a"),
        ] {
            sm.apply(&command).await.unwrap();
        }
        assert!(!sm.store().contains("a").await);

        let reordered = KvStateMachine::new(MapStore::default());
        for command in [
            Command::delete("a"),
            Command::set("a", "1"),
            Command::set("a", "2"),
        ] {
            reordered.apply(&command).await.unwrap();
        }
        assert_eq!(reordered.store().get("a").await, Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let sm = KvStateMachine::new(BrokenDisk);
        let err = sm.apply(&Command::set("k", "v")).await.unwrap_err();
        assert!(err.is_node_fatal());

        // Rejection happens before the store is touched
        let outcome = sm
            .apply(&Command::new(Operation::parse("BUMP"), "k", ""))
            .await
            .unwrap();
        assert!(!outcome.is_applied());
    }
}

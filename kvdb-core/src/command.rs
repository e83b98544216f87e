//! # Commands
//!
//! The command envelope carried as opaque bytes through the consensus
//! sidecar and applied by every replica.

use crate::{snapshot, KvError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation requested by a [`Command`].
///
/// Operation names travel as strings on the wire so that an operation this
/// node does not know still decodes; the state machine then rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operation {
    /// Insert or overwrite a key
    Set,
    /// Remove a key
    Delete,
    /// Any operation name this node does not recognize
    Unknown(String),
}

impl Operation {
    pub fn parse(name: &str) -> Self {
        Operation::from(name.to_string())
    }

    /// Wire name of the operation
    pub fn as_str(&self) -> &str {
        match self {
            Operation::Set => "SET",
            Operation::Delete => "DELETE",
            Operation::Unknown(name) => name,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Operation::Unknown(_))
    }
}

impl From<String> for Operation {
    fn from(name: String) -> Self {
        match name.as_str() {
            "SET" => Operation::Set,
            "DELETE" => Operation::Delete,
            _ => Operation::Unknown(name),
        }
    }
}

impl From<Operation> for String {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single key-value command.
///
/// Encoded as a field-tagged map `{"op": .., "key": .., "value": ..}`.
/// `value` is only meaningful for [`Operation::Set`] and may be omitted on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "op")]
    pub operation: Operation,
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Command {
    pub fn new(operation: Operation, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operation,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Operation::Set, key, value)
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self::new(Operation::Delete, key, String::new())
    }

    /// Checks that the command can be applied on every replica.
    ///
    /// A command is valid iff its operation is recognized, its key is
    /// non-empty, and both key and value fit the `key=value` snapshot
    /// record format.
    pub fn validate(&self) -> Result<()> {
        if !self.operation.is_recognized() {
            return Err(KvError::unknown_operation(self.operation.as_str()));
        }
        if self.key.is_empty() {
            return Err(KvError::invalid_command("key cannot be empty"));
        }
        if !snapshot::is_representable_key(&self.key) {
            return Err(KvError::invalid_command(
                "key cannot contain '=' or line breaks",
            ));
        }
        if self.operation == Operation::Set && !snapshot::is_representable_value(&self.value) {
            return Err(KvError::invalid_command("value cannot contain line breaks"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::parse("SET"), Operation::Set);
        assert_eq!(Operation::parse("DELETE"), Operation::Delete);
        assert_eq!(
            Operation::parse("set"),
            Operation::Unknown("set".to_string())
        );
        assert_eq!(String::from(Operation::Unknown("BUMP".into())), "BUMP");
        assert_eq!(Operation::Delete.to_string(), "DELETE");
    }

    #[test]
    fn test_validation() {
        assert!(Command::set("user_1", "alice").validate().is_ok());
        assert!(Command::delete("user_1").validate().is_ok());
        assert!(Command::set("k", "a=b").validate().is_ok());

        let err = Command::new(Operation::parse("BUMP"), "x", "")
            .validate()
            .unwrap_err();
        assert!(matches!(err, KvError::UnknownOperation { .. }));

        let err = Command::set("", "v").validate().unwrap_err();
        assert!(matches!(err, KvError::InvalidCommand { .. }));

        assert!(Command::set("a=b", "v").validate().is_err());
        assert!(Command::set("a\nb", "v").validate().is_err());
        assert!(Command::set("k", "line\nbreak").validate().is_err());

        // DELETE ignores its value
        let delete = Command::new(Operation::Delete, "k", "ignored\n");
        assert!(delete.validate().is_ok());
    }
}

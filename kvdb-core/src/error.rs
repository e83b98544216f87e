//! # Error Types
//!
//! Error taxonomy for the replicated key-value node.

use std::time::Duration;
use thiserror::Error;

/// Error types that can occur while decoding, applying, persisting or
/// proposing commands.
///
/// The variants fall into three recovery classes:
///
/// - **Recovered locally**: [`KvError::Decode`], [`KvError::UnknownOperation`]
///   and [`KvError::InvalidCommand`] are turned into boolean results at the
///   RPC boundary and never stop a serving loop.
/// - **Recovered as a rejected proposal**: [`KvError::TransportTimeout`] and
///   [`KvError::Transport`] become `accepted = false`.
/// - **Node-fatal**: [`KvError::Persistence`] and [`KvError::Io`] mean the
///   in-memory map and its on-disk snapshot may have diverged.
///
/// # Examples
///
/// ```rust
/// use kvdb_core::KvError;
///
/// let error = KvError::persistence("disk full");
/// assert!(error.is_node_fatal());
///
/// let error = KvError::decode("truncated input");
/// assert!(!error.is_node_fatal());
/// ```
#[derive(Error, Debug)]
pub enum KvError {
    /// Command bytes could not be decoded
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Command could not be encoded
    #[error("Encode error: {message}")]
    Encode { message: String },

    /// Snapshot could not be written or read back
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Proposal did not complete within its deadline
    #[error("Proposal timed out after {timeout:?}")]
    TransportTimeout { timeout: Duration },

    /// Sidecar RPC failed before producing an answer
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// Command named an operation this state machine does not know
    #[error("Unknown operation: {operation}")]
    UnknownOperation { operation: String },

    /// Command is structurally valid but cannot be applied
    #[error("Invalid command: {reason}")]
    InvalidCommand { reason: String },

    /// File system I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results in the kvdb node.
pub type Result<T> = std::result::Result<T, KvError>;

impl KvError {
    /// Creates a new decode error with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a new encode error with the given message.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Creates a new persistence error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use kvdb_core::KvError;
    ///
    /// let error = KvError::persistence("rename failed");
    /// assert_eq!(error.to_string(), "Persistence error: rename failed");
    /// ```
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Creates a new transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    pub fn invalid_command(reason: impl Into<String>) -> Self {
        Self::InvalidCommand {
            reason: reason.into(),
        }
    }

    /// Whether this error means the node can no longer guarantee that its
    /// in-memory state matches its durable snapshot.
    ///
    /// A node that observes such an error must stop serving instead of
    /// continuing with a store that silently diverges from disk.
    pub fn is_node_fatal(&self) -> bool {
        matches!(self, Self::Persistence { .. } | Self::Io(_))
    }

    /// Determines if this error condition is potentially transient.
    ///
    /// Nothing in the node retries on its own; this only tells callers that
    /// re-proposing may succeed later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::TransportTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let error = KvError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        ));
        assert!(error.is_node_fatal());
        assert!(!error.is_retryable());

        let error = KvError::TransportTimeout {
            timeout: Duration::from_secs(5),
        };
        assert!(error.is_retryable());
        assert!(!error.is_node_fatal());

        let error = KvError::unknown_operation("BUMP");
        assert!(!error.is_retryable());
        assert!(!error.is_node_fatal());
        assert_eq!(error.to_string(), "Unknown operation: BUMP");
    }
}

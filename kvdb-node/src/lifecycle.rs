//! Coordinated shutdown shared by the node's serving tasks.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Why the node stopped serving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Operator asked the node to stop
    Requested,
    /// A snapshot rewrite failed; memory and disk may disagree
    Fatal(String),
    /// A serving task ended on its own
    ServerExited(&'static str),
}

impl ShutdownReason {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("shutdown requested"),
            Self::Fatal(message) => write!(f, "fatal error: {}", message),
            Self::ServerExited(server) => write!(f, "{} server exited", server),
        }
    }
}

/// One-shot, cloneable shutdown signal.
///
/// The first trigger wins; later triggers are ignored so the original
/// reason is what the node reports.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self, reason: ShutdownReason) {
        let accepted = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason.clone());
            true
        });

        if accepted {
            if reason.is_fatal() {
                error!("Node shutting down: {}", reason);
            } else {
                info!("Node shutting down: {}", reason);
            }
        }
    }

    pub fn reason(&self) -> Option<ShutdownReason> {
        self.tx.borrow().clone()
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Resolve once the signal has been triggered.
    pub async fn wait(&self) -> ShutdownReason {
        let mut rx = self.tx.subscribe();
        loop {
            if let Some(reason) = rx.borrow_and_update().clone() {
                return reason;
            }
            if rx.changed().await.is_err() {
                // Unreachable while `self` holds the sender
                return ShutdownReason::Requested;
            }
        }
    }
}

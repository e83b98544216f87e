//! In-process [`ConsensusGateway`] that records proposals instead of
//! sending them anywhere.

use async_trait::async_trait;
use bytes::Bytes;
use kvdb_core::ConsensusGateway;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Records every proposal and answers with a fixed verdict.
///
/// Replaying [`RecordingGateway::proposals`] into an apply service stands in
/// for a sidecar that commits in proposal order.
#[derive(Debug)]
pub struct RecordingGateway {
    accept: AtomicBool,
    proposals: Mutex<Vec<Bytes>>,
}

impl Default for RecordingGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingGateway {
    /// Gateway that accepts every proposal.
    pub fn new() -> Self {
        Self {
            accept: AtomicBool::new(true),
            proposals: Mutex::new(Vec::new()),
        }
    }

    /// Gateway that rejects every proposal.
    pub fn rejecting() -> Self {
        let gateway = Self::new();
        gateway.set_accept(false);
        gateway
    }

    pub fn set_accept(&self, accept: bool) {
        self.accept.store(accept, Ordering::Release);
    }

    pub fn proposals(&self) -> Vec<Bytes> {
        self.proposals.lock().clone()
    }

    /// Remove and return everything proposed so far.
    pub fn drain(&self) -> Vec<Bytes> {
        std::mem::take(&mut *self.proposals.lock())
    }
}

#[async_trait]
impl ConsensusGateway for RecordingGateway {
    async fn propose(&self, command: Bytes) -> bool {
        self.proposals.lock().push(command);
        self.accept.load(Ordering::Acquire)
    }
}

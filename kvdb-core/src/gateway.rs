use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Deadline applied to every proposal sent to the consensus sidecar.
pub const PROPOSE_DEADLINE: Duration = Duration::from_secs(5);

/// Capability interface for submitting commands to the consensus sidecar.
///
/// `propose` returns `true` only when the sidecar reports that it accepted
/// the command; that says nothing about whether this node has applied it
/// yet. `false` covers rejection, transport failure and deadline expiry.
/// After a deadline expiry the sidecar may still have accepted the command,
/// so callers that re-propose must tolerate the command being applied twice.
#[async_trait]
pub trait ConsensusGateway: Send + Sync {
    async fn propose(&self, command: Bytes) -> bool;
}

#[async_trait]
impl<T: ConsensusGateway + ?Sized> ConsensusGateway for Arc<T> {
    async fn propose(&self, command: Bytes) -> bool {
        (**self).propose(command).await
    }
}

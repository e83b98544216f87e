//! # Consensus Gateway
//!
//! Client side of the sidecar's `RaftNode.Propose` RPC.

use crate::proto::{raft_node_client::RaftNodeClient, Command as ProtoCommand};
use async_trait::async_trait;
use bytes::Bytes;
use kvdb_core::{ConsensusGateway, KvError, Result, PROPOSE_DEADLINE};
use std::time::Duration;
use tokio::time::timeout;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, warn};

/// One proposal round trip to the sidecar, without any deadline.
#[async_trait]
pub trait SidecarTransport: Send + Sync {
    /// Returns whether the sidecar accepted the command.
    async fn propose(&self, command: Bytes) -> Result<bool>;
}

/// gRPC transport over a single long-lived channel.
///
/// The channel connects lazily and reconnects on its own, so the node can
/// start before its sidecar does.
#[derive(Debug, Clone)]
pub struct GrpcSidecarTransport {
    client: RaftNodeClient<Channel>,
}

impl GrpcSidecarTransport {
    pub fn connect_lazy(endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        let channel = Endpoint::from_shared(endpoint.clone())
            .map_err(|e| {
                KvError::transport(format!("Invalid sidecar endpoint {}: {}", endpoint, e))
            })?
            .connect_lazy();
        Ok(Self::new(channel))
    }

    pub fn new(channel: Channel) -> Self {
        Self {
            client: RaftNodeClient::new(channel),
        }
    }
}

#[async_trait]
impl SidecarTransport for GrpcSidecarTransport {
    async fn propose(&self, command: Bytes) -> Result<bool> {
        let mut client = self.client.clone();
        let request = tonic::Request::new(ProtoCommand {
            data: command.to_vec(),
        });

        let reply = client
            .propose(request)
            .await
            .map_err(|status| KvError::transport(format!("Propose failed: {}", status)))?
            .into_inner();

        if !reply.success {
            debug!("Sidecar rejected proposal: {}", reply.error);
        }
        Ok(reply.success)
    }
}

/// [`ConsensusGateway`] that bounds every proposal by a deadline.
///
/// Proposals are at-most-once from this side: a failure or an expired
/// deadline yields `false` and nothing is retried. An expired proposal may
/// still have been accepted by the sidecar.
#[derive(Debug, Clone)]
pub struct SidecarGateway<T> {
    transport: T,
    deadline: Duration,
}

impl SidecarGateway<GrpcSidecarTransport> {
    /// Gateway over a lazily connected gRPC channel to `endpoint`.
    pub fn connect_lazy(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self::new(GrpcSidecarTransport::connect_lazy(endpoint)?))
    }
}

impl<T: SidecarTransport> SidecarGateway<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            deadline: PROPOSE_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Like [`ConsensusGateway::propose`] but keeps the failure cause.
    pub async fn try_propose(&self, command: Bytes) -> Result<bool> {
        match timeout(self.deadline, self.transport.propose(command)).await {
            Ok(result) => result,
            Err(_) => Err(KvError::TransportTimeout {
                timeout: self.deadline,
            }),
        }
    }
}

#[async_trait]
impl<T: SidecarTransport> ConsensusGateway for SidecarGateway<T> {
    async fn propose(&self, command: Bytes) -> bool {
        match self.try_propose(command).await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Proposal not accepted: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Silent;

    #[async_trait]
    impl SidecarTransport for Silent {
        async fn propose(&self, _command: Bytes) -> Result<bool> {
            std::future::pending().await
        }
    }

    struct Slow(Duration);

    #[async_trait]
    impl SidecarTransport for Slow {
        async fn propose(&self, _command: Bytes) -> Result<bool> {
            tokio::time::sleep(self.0).await;
            Ok(true)
        }
    }

    #[derive(Default)]
    struct Flaky {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SidecarTransport for Flaky {
        async fn propose(&self, _command: Bytes) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(KvError::transport("connection refused"))
        }
    }

    struct Answer(bool);

    #[async_trait]
    impl SidecarTransport for Answer {
        async fn propose(&self, _command: Bytes) -> Result<bool> {
            Ok(self.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresponsive_sidecar_times_out_after_five_seconds() {
        let gateway = SidecarGateway::new(Silent);
        assert_eq!(gateway.deadline(), Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        assert!(!gateway.propose(Bytes::from_static(b"cmd")).await);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(6));

        let err = gateway
            .try_propose(Bytes::from_static(b"cmd"))
            .await
            .unwrap_err();
        assert!(matches!(err, KvError::TransportTimeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_within_deadline_is_kept() {
        let gateway = SidecarGateway::new(Slow(Duration::from_millis(4900)));
        assert!(gateway.propose(Bytes::from_static(b"cmd")).await);

        let gateway = SidecarGateway::new(Slow(Duration::from_millis(5100)));
        assert!(!gateway.propose(Bytes::from_static(b"cmd")).await);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let transport = Flaky::default();
        let calls = transport.calls.clone();
        let gateway = SidecarGateway::new(transport);

        assert!(!gateway.propose(Bytes::from_static(b"cmd")).await);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_sidecar_verdict_is_passed_through() {
        assert!(SidecarGateway::new(Answer(true)).propose(Bytes::new()).await);
        assert!(!SidecarGateway::new(Answer(false)).propose(Bytes::new()).await);
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        let err = SidecarGateway::connect_lazy("not a uri").unwrap_err();
        assert!(matches!(err, KvError::Transport { .. }));
    }
}

//! # Fake Raft Sidecar
//!
//! A single-member stand-in for the consensus sidecar. It serves
//! `RaftNode.Propose` and, in [`SidecarMode::Commit`], immediately "commits"
//! each proposal by calling `StateMachine.Apply` on the node it is attached
//! to.

use kvdb_node::proto::{
    raft_node_server::{RaftNode, RaftNodeServer},
    state_machine_client::StateMachineClient,
    Command as ProtoCommand, ProposeResponse,
};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Channel, Endpoint, Server};
use tonic::{Request, Response, Status};
use tracing::{debug, warn};

/// How the fake answers proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarMode {
    /// Apply on the attached node, then accept
    Commit,
    /// Refuse without applying, like a follower
    Reject,
    /// Never answer
    Hang,
}

struct SidecarState {
    mode: Mutex<SidecarMode>,
    apply_target: Mutex<Option<StateMachineClient<Channel>>>,
    /// One commit at a time keeps applies in proposal order
    commit_lock: tokio::sync::Mutex<()>,
    proposals: Mutex<Vec<Vec<u8>>>,
}

struct RaftNodeService {
    state: Arc<SidecarState>,
}

#[tonic::async_trait]
impl RaftNode for RaftNodeService {
    async fn propose(
        &self,
        request: Request<ProtoCommand>,
    ) -> Result<Response<ProposeResponse>, Status> {
        let command = request.into_inner();
        self.state.proposals.lock().push(command.data.clone());

        let mode = *self.state.mode.lock();
        match mode {
            SidecarMode::Reject => Ok(reply(false, "not the leader")),
            SidecarMode::Hang => std::future::pending().await,
            SidecarMode::Commit => {
                let _commit = self.state.commit_lock.lock().await;
                let target = self.state.apply_target.lock().clone();
                let Some(mut client) = target else {
                    return Ok(reply(false, "no state machine attached"));
                };

                match client.apply(command).await {
                    Ok(applied) => {
                        // A committed entry stays committed even if the
                        // state machine refuses it
                        debug!("Committed entry, applied={}", applied.into_inner().success);
                        Ok(reply(true, ""))
                    }
                    Err(status) => {
                        warn!("Apply failed: {}", status);
                        Ok(reply(false, status.message()))
                    }
                }
            }
        }
    }
}

fn reply(success: bool, error: &str) -> Response<ProposeResponse> {
    Response::new(ProposeResponse {
        success,
        error: error.to_string(),
    })
}

/// Running fake sidecar. The server stops when this is dropped.
pub struct FakeSidecar {
    addr: SocketAddr,
    state: Arc<SidecarState>,
    server: JoinHandle<()>,
}

impl FakeSidecar {
    pub async fn start(mode: SidecarMode) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(SidecarState {
            mode: Mutex::new(mode),
            apply_target: Mutex::new(None),
            commit_lock: tokio::sync::Mutex::new(()),
            proposals: Mutex::new(Vec::new()),
        });

        let service = RaftNodeService {
            state: state.clone(),
        };
        let server = tokio::spawn(async move {
            if let Err(e) = Server::builder()
                .add_service(RaftNodeServer::new(service))
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
            {
                warn!("Fake sidecar stopped: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn set_mode(&self, mode: SidecarMode) {
        *self.state.mode.lock() = mode;
    }

    /// Route committed entries to the `StateMachine` service at `addr`.
    pub fn attach(&self, addr: SocketAddr) -> Result<(), tonic::transport::Error> {
        let channel = Endpoint::from_shared(format!("http://{}", addr))?.connect_lazy();
        *self.state.apply_target.lock() = Some(StateMachineClient::new(channel));
        Ok(())
    }

    /// Every payload proposed so far, in arrival order.
    pub fn proposals(&self) -> Vec<Vec<u8>> {
        self.state.proposals.lock().clone()
    }
}

impl Drop for FakeSidecar {
    fn drop(&mut self) {
        self.server.abort();
    }
}

//! # Apply Service
//!
//! Server side of `StateMachine.Apply`, called by the sidecar once per
//! committed log entry.

use crate::lifecycle::{Shutdown, ShutdownReason};
use crate::proto::{
    state_machine_server::{StateMachine, StateMachineServer},
    ApplyResponse, Command as ProtoCommand,
};
use kvdb_core::{ApplyOutcome, CommandCodec, KeyValueStore, KvStateMachine, Result};
use tokio::sync::Mutex;
use tonic::{Request, Response, Status};
use tracing::{debug, error, warn};

/// Applies committed entries to the local store, one at a time.
///
/// The sidecar delivers entries in commit order. `apply_lock` additionally
/// guarantees that an entry's mutation and snapshot rewrite finish before
/// the next entry starts, even if the transport dispatches calls
/// concurrently.
pub struct ApplyService<S> {
    state_machine: KvStateMachine<S>,
    codec: CommandCodec,
    apply_lock: Mutex<()>,
    shutdown: Option<Shutdown>,
}

impl<S: KeyValueStore> ApplyService<S> {
    pub fn new(store: S) -> Self {
        Self {
            state_machine: KvStateMachine::new(store),
            codec: CommandCodec::new(),
            apply_lock: Mutex::new(()),
            shutdown: None,
        }
    }

    /// Signal `shutdown` when a snapshot rewrite fails.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn store(&self) -> &S {
        self.state_machine.store()
    }

    /// Decode and apply one committed entry.
    ///
    /// Returns `Ok(false)` for undecodable or rejected commands; the store is
    /// unchanged in both cases. `Err` means the store failed to persist the
    /// change and the node must stop.
    pub async fn apply_entry(&self, data: &[u8]) -> Result<bool> {
        let command = match self.codec.decode(data) {
            Ok(command) => command,
            Err(e) => {
                warn!("Dropping undecodable entry ({} bytes): {}", data.len(), e);
                return Ok(false);
            }
        };

        let _guard = self.apply_lock.lock().await;
        match self.state_machine.apply(&command).await {
            Ok(ApplyOutcome::Applied) => {
                debug!("Applied: {} {}", command.operation, command.key);
                Ok(true)
            }
            Ok(ApplyOutcome::Rejected { reason }) => {
                warn!("Rejected: {} {} ({})", command.operation, command.key, reason);
                Ok(false)
            }
            Err(e) => {
                error!("Failed to apply {} {}: {}", command.operation, command.key, e);
                if let Some(shutdown) = &self.shutdown {
                    shutdown.trigger(ShutdownReason::Fatal(e.to_string()));
                }
                Err(e)
            }
        }
    }
}

impl<S: KeyValueStore + 'static> ApplyService<S> {
    pub fn into_server(self) -> StateMachineServer<Self> {
        StateMachineServer::new(self)
    }
}

#[tonic::async_trait]
impl<S: KeyValueStore + 'static> StateMachine for ApplyService<S> {
    async fn apply(
        &self,
        request: Request<ProtoCommand>,
    ) -> std::result::Result<Response<ApplyResponse>, Status> {
        let command = request.into_inner();
        match self.apply_entry(&command.data).await {
            Ok(success) => Ok(Response::new(ApplyResponse { success })),
            Err(e) => Err(Status::internal(e.to_string())),
        }
    }
}

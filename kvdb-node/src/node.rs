//! # Node Wiring
//!
//! Builds the store, the sidecar gateway and both servers, and ties their
//! lifetimes to one [`Shutdown`] signal.

use crate::apply::ApplyService;
use crate::config::NodeConfig;
use crate::gateway::{GrpcSidecarTransport, SidecarGateway};
use crate::http::create_router;
use crate::ingress::CommandIngress;
use crate::lifecycle::{Shutdown, ShutdownReason};
use kvdb_core::{KvError, Result};
use kvdb_kvstore::DurableStore;
use kvdb_persistence::FileSystemPersistence;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{error, info};

pub type NodeStore = Arc<DurableStore<FileSystemPersistence>>;
pub type NodeGateway = SidecarGateway<GrpcSidecarTransport>;

/// A running node.
///
/// Dropping the handle does not stop the servers; trigger
/// [`NodeHandle::shutdown`] and [`NodeHandle::join`] instead.
pub struct NodeHandle {
    http_addr: SocketAddr,
    grpc_addr: SocketAddr,
    shutdown: Shutdown,
    store: NodeStore,
    tasks: Vec<JoinHandle<()>>,
}

impl NodeHandle {
    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        self.grpc_addr
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Wait for the shutdown signal, then for both servers to drain.
    pub async fn join(self) -> ShutdownReason {
        let reason = self.shutdown.wait().await;
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("Server task panicked: {}", e);
            }
        }
        info!("Node stopped: {}", reason);
        reason
    }

    /// Request shutdown and wait for it to complete.
    pub async fn stop(self) -> ShutdownReason {
        self.shutdown.trigger(ShutdownReason::Requested);
        self.join().await
    }
}

/// Load the store, bind both listeners and start serving.
///
/// Port 0 binds an ephemeral port; the bound addresses are available on the
/// returned handle. Fails before anything is spawned if the store cannot be
/// loaded or a port cannot be bound.
pub async fn start_node(config: NodeConfig) -> Result<NodeHandle> {
    let store: NodeStore = Arc::new(DurableStore::open(config.store_config()).await?);
    let gateway: NodeGateway = SidecarGateway::connect_lazy(config.sidecar_endpoint())?
        .with_deadline(config.propose_timeout);

    let grpc_listener = bind(&config.grpc_address()).await?;
    let http_listener = bind(&config.http_address()).await?;
    let grpc_addr = grpc_listener.local_addr()?;
    let http_addr = http_listener.local_addr()?;

    let shutdown = Shutdown::new();
    let apply = ApplyService::new(store.clone()).with_shutdown(shutdown.clone());
    let ingress = Arc::new(CommandIngress::new(store.clone(), gateway));

    let grpc_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            info!("StateMachine service listening on {}", grpc_addr);
            let signal = shutdown.clone();
            let result = Server::builder()
                .add_service(apply.into_server())
                .serve_with_incoming_shutdown(TcpListenerStream::new(grpc_listener), async move {
                    signal.wait().await;
                })
                .await;
            if let Err(e) = result {
                error!("gRPC server failed: {}", e);
            }
            shutdown.trigger(ShutdownReason::ServerExited("grpc"));
        })
    };

    let http_task = {
        let shutdown = shutdown.clone();
        let router = create_router(ingress);
        tokio::spawn(async move {
            info!("HTTP server listening on {}", http_addr);
            let signal = shutdown.clone();
            let result = axum::serve(http_listener, router)
                .with_graceful_shutdown(async move {
                    signal.wait().await;
                })
                .await;
            if let Err(e) = result {
                error!("HTTP server failed: {}", e);
            }
            shutdown.trigger(ShutdownReason::ServerExited("http"));
        })
    };

    info!(
        "Node started: http={} grpc={} sidecar={}",
        http_addr,
        grpc_addr,
        config.sidecar_endpoint()
    );

    Ok(NodeHandle {
        http_addr,
        grpc_addr,
        shutdown,
        store,
        tasks: vec![grpc_task, http_task],
    })
}

async fn bind(address: &str) -> Result<TcpListener> {
    TcpListener::bind(address)
        .await
        .map_err(|e| KvError::transport(format!("Failed to bind {}: {}", address, e)))
}

//! # kvdb Node
//!
//! Process-level pieces of a kvdb node:
//!
//! - [`ingress::CommandIngress`] and the [`http`] router clients talk to
//! - [`gateway::SidecarGateway`], which forwards writes to the Raft sidecar
//! - [`apply::ApplyService`], which the sidecar calls for committed entries
//! - [`node::start_node`], which wires them to a [`lifecycle::Shutdown`]

pub mod apply;
pub mod config;
pub mod gateway;
pub mod http;
pub mod ingress;
pub mod lifecycle;
pub mod node;

/// Generated types for the sidecar protocol (`proto/consensus.proto`).
pub mod proto {
    tonic::include_proto!("consensus");
}

pub use apply::ApplyService;
pub use config::{Cli, NodeConfig};
pub use gateway::{GrpcSidecarTransport, SidecarGateway, SidecarTransport};
pub use http::create_router;
pub use ingress::{CommandIngress, WriteReply, KEY_NOT_FOUND};
pub use lifecycle::{Shutdown, ShutdownReason};
pub use node::{start_node, NodeHandle};

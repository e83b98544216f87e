use clap::Parser;
use kvdb_core::PROPOSE_DEADLINE;
use kvdb_kvstore::DurableStoreConfig;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Client-facing HTTP port
    pub http_port: u16,
    /// Port of the StateMachine service the sidecar calls
    pub grpc_port: u16,
    /// Port of the sidecar's RaftNode service
    pub sidecar_port: u16,
    pub sidecar_host: String,
    /// Snapshot file backing the store
    pub db_file: PathBuf,
    pub sync_on_write: bool,
    pub propose_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            grpc_port: 50051,
            sidecar_port: 50052,
            sidecar_host: "localhost".to_string(),
            db_file: PathBuf::from("kv.db"),
            sync_on_write: true,
            propose_timeout: PROPOSE_DEADLINE,
        }
    }
}

impl NodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_http_port(mut self, port: u16) -> Self {
        self.http_port = port;
        self
    }

    pub fn with_grpc_port(mut self, port: u16) -> Self {
        self.grpc_port = port;
        self
    }

    pub fn with_sidecar_port(mut self, port: u16) -> Self {
        self.sidecar_port = port;
        self
    }

    pub fn with_sidecar_host(mut self, host: impl Into<String>) -> Self {
        self.sidecar_host = host.into();
        self
    }

    pub fn with_db_file(mut self, db_file: impl Into<PathBuf>) -> Self {
        self.db_file = db_file.into();
        self
    }

    pub fn with_sync_on_write(mut self, sync_on_write: bool) -> Self {
        self.sync_on_write = sync_on_write;
        self
    }

    pub fn with_propose_timeout(mut self, timeout: Duration) -> Self {
        self.propose_timeout = timeout;
        self
    }

    pub fn http_address(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }

    pub fn grpc_address(&self) -> String {
        format!("0.0.0.0:{}", self.grpc_port)
    }

    pub fn sidecar_endpoint(&self) -> String {
        format!("http://{}:{}", self.sidecar_host, self.sidecar_port)
    }

    pub fn store_config(&self) -> DurableStoreConfig {
        DurableStoreConfig::new(self.db_file.clone()).with_sync_on_write(self.sync_on_write)
    }
}

/// Command-line arguments for a kvdb node.
#[derive(Parser, Debug)]
#[command(name = "kvdb-node")]
#[command(about = "Replicated key-value node driven by a Raft sidecar", long_about = None)]
pub struct Cli {
    /// Client-facing HTTP port
    #[arg(default_value_t = 8080)]
    pub http_port: u16,

    /// Port the sidecar calls StateMachine.Apply on
    #[arg(default_value_t = 50051)]
    pub grpc_port: u16,

    /// Port of the sidecar's RaftNode.Propose service
    #[arg(default_value_t = 50052)]
    pub sidecar_port: u16,

    /// Snapshot file backing the store
    #[arg(default_value = "kv.db")]
    pub db_file: PathBuf,

    /// Host the sidecar listens on
    #[arg(long, default_value = "localhost")]
    pub sidecar_host: String,

    /// Deadline for each proposal, in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub propose_timeout_ms: u64,

    /// Skip fsync when rewriting the snapshot
    #[arg(long)]
    pub no_sync: bool,
}

impl From<Cli> for NodeConfig {
    fn from(cli: Cli) -> Self {
        NodeConfig::new()
            .with_http_port(cli.http_port)
            .with_grpc_port(cli.grpc_port)
            .with_sidecar_port(cli.sidecar_port)
            .with_db_file(cli.db_file)
            .with_sidecar_host(cli.sidecar_host)
            .with_propose_timeout(Duration::from_millis(cli.propose_timeout_ms))
            .with_sync_on_write(!cli.no_sync)
    }
}

use anyhow::bail;
use clap::Parser;
use kvdb_node::{start_node, Cli, NodeConfig, ShutdownReason};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = NodeConfig::from(cli);
    info!("Opening store at {}", config.db_file.display());
    let node = start_node(config).await?;

    let shutdown = node.shutdown().clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => shutdown.trigger(ShutdownReason::Requested),
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    match node.join().await {
        ShutdownReason::Requested => Ok(()),
        reason => bail!("node stopped: {}", reason),
    }
}

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quorum_kv::config::NodeConfig;
use quorum_kv::replication::{Coordinator, Topology};
use quorum_kv::service::router;
use quorum_kv::storage::{FjallEngine, LocalStore, MemEngine, StorageEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = NodeConfig::parse();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    config.validate()?;

    // 1. Storage engine:
    let engine: Arc<dyn StorageEngine> = match &config.data_dir {
        Some(dir) => {
            tracing::info!("Opening on-disk storage at {}", dir.display());
            Arc::new(
                FjallEngine::open(dir)
                    .with_context(|| format!("failed to open storage at {}", dir.display()))?,
            )
        }
        None => {
            tracing::info!("No data directory given, keeping records in memory");
            Arc::new(MemEngine::new())
        }
    };
    let store = LocalStore::new(engine);

    // 2. Cluster topology:
    let me = config.self_node();
    let topology = Topology::new(&me, config.cluster()).context("invalid cluster membership")?;
    tracing::info!("Node {} in a cluster of {}", me, topology.len());
    for node in topology.nodes() {
        tracing::info!("  - {}", node);
    }

    // 3. Coordinator and HTTP router:
    let http_client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let coordinator = Arc::new(Coordinator::new(
        store.clone(),
        Arc::new(topology),
        http_client,
        config.coordinator(),
    ));
    let app = router(coordinator);

    // 4. Start HTTP server:
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 5. Flush storage before exit:
    tracing::info!("Shutting down, compacting storage");
    tokio::task::spawn_blocking(move || store.compact()).await??;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
    }
}

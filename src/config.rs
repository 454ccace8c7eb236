//! Node configuration, read from the command line with environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::replication::CoordinatorConfig;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("port {0} is outside 1025..=65534")]
    Port(u16),
    #[error("timeouts must be positive")]
    ZeroTimeout,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "quorum-kv", about = "Replicated key-value node")]
pub struct NodeConfig {
    /// HTTP port to listen on.
    #[arg(long, env = "QKV_PORT", default_value_t = 8080)]
    pub port: u16,
    /// Identifier of this node as listed in the cluster, `http://localhost:<port>` when unset.
    #[arg(long, env = "QKV_NODE")]
    pub node: Option<String>,
    /// Cluster member, repeatable. This node is added when missing.
    #[arg(long = "peer", env = "QKV_PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,
    /// Directory of the on-disk engine. Without it records live in memory.
    #[arg(long, env = "QKV_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, env = "QKV_REPLICA_TIMEOUT_MS", default_value_t = 500)]
    pub replica_timeout_ms: u64,
    #[arg(long, env = "QKV_REQUEST_TIMEOUT_MS", default_value_t = 1000)]
    pub request_timeout_ms: u64,
    #[arg(long, env = "QKV_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

impl NodeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port <= 1024 || self.port == u16::MAX {
            return Err(ConfigError::Port(self.port));
        }
        if self.replica_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn self_node(&self) -> String {
        match &self.node {
            Some(node) => normalize(node),
            None => format!("http://localhost:{}", self.port),
        }
    }

    /// Every cluster member, including this node.
    pub fn cluster(&self) -> Vec<String> {
        let me = self.self_node();
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .map(|p| normalize(p))
            .filter(|p| !p.is_empty())
            .collect();
        if !nodes.contains(&me) {
            nodes.push(me);
        }
        nodes
    }

    pub fn coordinator(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            replica_timeout: Duration::from_millis(self.replica_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

/// Node ids compare as strings, so spelling variants of one URL must collapse.
fn normalize(node: &str) -> String {
    node.trim().trim_end_matches('/').to_string()
}

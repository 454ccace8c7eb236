//! Replication Coordinator
//!
//! Turns one client request into `from` replica sub-operations and decides the
//! client-visible result once `ack` of them agree.
//!
//! ## Request lifecycle
//! 1. **Routing**: validate the `ack/from` pair and compute the preference list.
//! 2. **Fan-out**: one task per replica, either against the local store or as an
//!    HTTP call carrying the service marker. Every call has its own timeout.
//! 3. **Aggregating**: outcomes are gathered by the quorum consumer under the
//!    request deadline.
//! 4. **Resolution**: reads pick the newest version (last write wins), writes
//!    only need the acknowledgements.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use uuid::Uuid;

use super::protocol::{ENDPOINT_ENTITY, HEADER_RECORD_TIMESTAMP, HEADER_SERVICE_REQUEST};
use super::quorum;
use super::replicas::ReplicaFactor;
use super::topology::Topology;
use crate::error::{KvError, StoreError};
use crate::storage::record::now_ms;
use crate::storage::{LocalStore, VersionedRecord};

/// Where a replica sub-operation executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replica {
    Local,
    Remote(String),
}

impl fmt::Display for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Replica::Local => f.write_str("local"),
            Replica::Remote(node) => f.write_str(node),
        }
    }
}

/// A single-key operation as sent to every replica.
#[derive(Debug, Clone)]
pub enum Operation {
    Get,
    Upsert { value: Bytes, timestamp: i64 },
    Remove { timestamp: i64 },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Get => "GET",
            Operation::Upsert { .. } => "UPSERT",
            Operation::Remove { .. } => "REMOVE",
        }
    }
}

/// Successful answer of one replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Raw record held by the replica, `None` if it has never seen the key.
    Record(Option<VersionedRecord>),
    Written,
}

#[derive(thiserror::Error, Debug)]
pub enum ReplicaError {
    #[error("local storage: {0}")]
    Storage(#[from] StoreError),
    #[error("request to {node} failed: {source}")]
    Transport {
        node: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{node} answered {status}")]
    Status { node: String, status: StatusCode },
    #[error("{node} did not answer within {timeout:?}")]
    Timeout { node: String, timeout: Duration },
    #[error("local task aborted: {0}")]
    Join(String),
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinatorConfig {
    /// Deadline of each replica sub-operation.
    pub replica_timeout: Duration,
    /// Deadline for reaching a quorum decision.
    pub request_timeout: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            replica_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_millis(1000),
        }
    }
}

pub struct Coordinator {
    store: LocalStore,
    topology: Arc<Topology>,
    http_client: reqwest::Client,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        store: LocalStore,
        topology: Arc<Topology>,
        http_client: reqwest::Client,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            topology,
            http_client,
            config,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Newest live value of `id` across `rf.ack` answering replicas.
    pub async fn get(&self, id: &str, rf: ReplicaFactor) -> Result<Vec<u8>, KvError> {
        let replies = self.execute(id, Operation::Get, rf).await?;
        let records = replies.into_iter().filter_map(|reply| match reply {
            Reply::Record(record) => record,
            Reply::Written => None,
        });
        resolve_latest(records)
            .and_then(VersionedRecord::into_value)
            .ok_or(KvError::NotFound)
    }

    pub async fn upsert(&self, id: &str, value: Bytes, rf: ReplicaFactor) -> Result<(), KvError> {
        let op = Operation::Upsert {
            value,
            timestamp: now_ms(),
        };
        self.execute(id, op, rf).await.map(|_| ())
    }

    pub async fn remove(&self, id: &str, rf: ReplicaFactor) -> Result<(), KvError> {
        let op = Operation::Remove { timestamp: now_ms() };
        self.execute(id, op, rf).await.map(|_| ())
    }

    async fn execute(
        &self,
        id: &str,
        op: Operation,
        rf: ReplicaFactor,
    ) -> Result<Vec<Reply>, KvError> {
        if id.is_empty() {
            return Err(KvError::InvalidRequest("empty id".into()));
        }
        rf.validate(self.topology.len())?;

        let request_id = Uuid::new_v4();
        let targets: Vec<Replica> = self
            .topology
            .replicas(id.as_bytes(), rf.from)
            .into_iter()
            .map(|node| {
                if self.topology.is_self(node) {
                    Replica::Local
                } else {
                    Replica::Remote(node.to_string())
                }
            })
            .collect();
        tracing::debug!(
            "Request {}: {} {:?} with replicas {} on {:?}",
            request_id,
            op.name(),
            id,
            rf,
            targets
        );

        let calls = targets
            .into_iter()
            .map(|target| {
                call_replica(
                    target,
                    self.store.clone(),
                    self.http_client.clone(),
                    id.to_string(),
                    op.clone(),
                    self.config.replica_timeout,
                )
            })
            .collect();
        let outcomes = quorum::fan_out(calls);

        match tokio::time::timeout(
            self.config.request_timeout,
            quorum::gather(outcomes, rf.from, rf.ack),
        )
        .await
        {
            Ok(Ok(replies)) => {
                tracing::debug!("Request {}: quorum reached with {} replies", request_id, replies.len());
                Ok(replies)
            }
            Ok(Err(e)) => {
                tracing::warn!("Request {}: {}", request_id, e);
                Err(KvError::InsufficientReplicas {
                    ack: e.ack,
                    from: e.total,
                    failed: e.failed,
                })
            }
            Err(_) => {
                tracing::warn!(
                    "Request {}: no quorum within {:?}",
                    request_id,
                    self.config.request_timeout
                );
                Err(KvError::Timeout)
            }
        }
    }
}

/// Last-write-wins merge of replica versions.
///
/// On equal timestamps a tombstone beats a live value, and between two live
/// values the lexicographically larger one wins.
pub fn resolve_latest<I>(records: I) -> Option<VersionedRecord>
where
    I: IntoIterator<Item = VersionedRecord>,
{
    records.into_iter().max_by(version_order)
}

fn version_order(a: &VersionedRecord, b: &VersionedRecord) -> Ordering {
    a.timestamp()
        .cmp(&b.timestamp())
        .then(a.is_tombstone().cmp(&b.is_tombstone()))
        .then_with(|| a.value().cmp(&b.value()))
}

/// Run `op` against local storage, as a replica.
pub fn apply_local(store: &LocalStore, key: &[u8], op: &Operation) -> Result<Reply, StoreError> {
    match op {
        Operation::Get => match store.get_record(key) {
            Ok(record) => Ok(Reply::Record(Some(record))),
            Err(StoreError::NotFound) => Ok(Reply::Record(None)),
            Err(e) => Err(e),
        },
        Operation::Upsert { value, timestamp } => store
            .upsert(key, &VersionedRecord::live(value.to_vec(), *timestamp))
            .map(|_| Reply::Written),
        Operation::Remove { timestamp } => store.remove_at(key, *timestamp).map(|_| Reply::Written),
    }
}

async fn call_replica(
    target: Replica,
    store: LocalStore,
    http_client: reqwest::Client,
    id: String,
    op: Operation,
    timeout: Duration,
) -> Result<Reply, ReplicaError> {
    let node = target.to_string();
    let call = async move {
        match target {
            Replica::Local => call_local(store, id, op).await,
            Replica::Remote(url) => call_remote(&http_client, &url, &id, op, timeout).await,
        }
    };

    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| ReplicaError::Timeout { node, timeout })?
}

async fn call_local(store: LocalStore, id: String, op: Operation) -> Result<Reply, ReplicaError> {
    let reply = tokio::task::spawn_blocking(move || apply_local(&store, id.as_bytes(), &op))
        .await
        .map_err(|e| ReplicaError::Join(e.to_string()))??;
    Ok(reply)
}

async fn call_remote(
    http_client: &reqwest::Client,
    node: &str,
    id: &str,
    op: Operation,
    timeout: Duration,
) -> Result<Reply, ReplicaError> {
    let url = format!("{}{}", node.trim_end_matches('/'), ENDPOINT_ENTITY);
    let request = match &op {
        Operation::Get => http_client.get(&url),
        Operation::Upsert { value, timestamp } => http_client
            .put(&url)
            .header(HEADER_RECORD_TIMESTAMP, timestamp.to_string())
            .body(value.clone()),
        Operation::Remove { timestamp } => http_client
            .delete(&url)
            .header(HEADER_RECORD_TIMESTAMP, timestamp.to_string()),
    };

    let transport = |source| ReplicaError::Transport {
        node: node.to_string(),
        source,
    };
    let response = request
        .query(&[("id", id)])
        .header(HEADER_SERVICE_REQUEST, "true")
        .timeout(timeout)
        .send()
        .await
        .map_err(transport)?;

    let status = response.status();
    tracing::debug!("Replica {} answered {} for {:?}", node, status, id);

    match (&op, status) {
        (Operation::Get, StatusCode::OK) => {
            let body = response.bytes().await.map_err(transport)?;
            Ok(Reply::Record(Some(VersionedRecord::from_bytes(&body)?)))
        }
        (Operation::Get, StatusCode::NOT_FOUND) => Ok(Reply::Record(None)),
        (Operation::Upsert { .. }, StatusCode::CREATED) => Ok(Reply::Written),
        (Operation::Remove { .. }, StatusCode::ACCEPTED) => Ok(Reply::Written),
        _ => Err(ReplicaError::Status {
            node: node.to_string(),
            status,
        }),
    }
}

//! Error kinds shared across the storage, replication and service layers.

/// Failures raised by a node's local storage.
///
/// A missing key is never reported as an I/O failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error("storage I/O failure: {0}")]
    Io(String),
}

/// Client-facing outcome of a replicated request.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    #[error("key not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("not enough replicas: {failed} of {from} failed, {ack} required")]
    InsufficientReplicas { ack: usize, from: usize, failed: usize },
    #[error("replicas did not answer before the deadline")]
    Timeout,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl KvError {
    /// Short machine-checkable code placed in error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            KvError::NotFound => "not_found",
            KvError::Storage(_) => "storage_failure",
            KvError::InsufficientReplicas { .. } => "not_enough_replicas",
            KvError::Timeout => "gateway_timeout",
            KvError::InvalidRequest(_) => "invalid_request",
        }
    }
}

impl From<StoreError> for KvError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => KvError::NotFound,
            StoreError::Io(msg) => KvError::Storage(msg),
        }
    }
}

use axum::{
    Json,
    body::Bytes,
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::stream::open_stream;
use crate::error::{KvError, StoreError};
use crate::replication::protocol::{HEADER_RECORD_TIMESTAMP, HEADER_SERVICE_REQUEST};
use crate::replication::{Coordinator, ReplicaFactor};
use crate::storage::record::now_ms;
use crate::storage::{LocalStore, VersionedRecord};

#[derive(Debug, Deserialize)]
pub struct EntityParams {
    pub id: Option<String>,
    pub replicas: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Body of every error response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(Deserialize))]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(err: &KvError) -> Response {
    let status = match err {
        KvError::NotFound => StatusCode::NOT_FOUND,
        KvError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        KvError::InsufficientReplicas { .. } => StatusCode::SERVICE_UNAVAILABLE,
        KvError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        KvError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorBody {
            error: err.code().to_string(),
        }),
    )
        .into_response()
}

fn is_service_request(headers: &HeaderMap) -> bool {
    headers
        .get(HEADER_SERVICE_REQUEST)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn record_timestamp(headers: &HeaderMap) -> i64 {
    headers
        .get(HEADER_RECORD_TIMESTAMP)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_else(now_ms)
}

/// Validated request target: the key and its quorum parameters.
struct Target {
    id: String,
    replicas: ReplicaFactor,
}

fn target(params: EntityParams, coordinator: &Coordinator) -> Result<Target, KvError> {
    let id = params
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| KvError::InvalidRequest("query requires id".into()))?;
    let replicas =
        ReplicaFactor::parse_or_default(params.replicas.as_deref(), coordinator.topology().len())?;
    Ok(Target { id, replicas })
}

pub async fn handle_status() -> &'static str {
    "OK"
}

pub async fn handle_default() -> (StatusCode, &'static str) {
    (StatusCode::BAD_REQUEST, "Wrong query")
}

pub async fn handle_get(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Query(params): Query<EntityParams>,
    headers: HeaderMap,
) -> Response {
    if is_service_request(&headers) {
        return match params.id.filter(|id| !id.is_empty()) {
            Some(id) => serve_local_get(coordinator.store().clone(), id).await,
            None => error_response(&KvError::InvalidRequest("query requires id".into())),
        };
    }

    let target = match target(params, &coordinator) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };
    match coordinator.get(&target.id, target.replicas).await {
        Ok(value) => (StatusCode::OK, value).into_response(),
        Err(e) => {
            if !matches!(e, KvError::NotFound) {
                tracing::error!("GET {:?} failed: {}", target.id, e);
            }
            error_response(&e)
        }
    }
}

pub async fn handle_put(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Query(params): Query<EntityParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if is_service_request(&headers) {
        let record = VersionedRecord::live(body.to_vec(), record_timestamp(&headers));
        return serve_local_write(coordinator.store().clone(), params.id, record, StatusCode::CREATED)
            .await;
    }

    let target = match target(params, &coordinator) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };
    match coordinator.upsert(&target.id, body, target.replicas).await {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(e) => {
            tracing::error!("PUT {:?} failed: {}", target.id, e);
            error_response(&e)
        }
    }
}

pub async fn handle_delete(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Query(params): Query<EntityParams>,
    headers: HeaderMap,
) -> Response {
    if is_service_request(&headers) {
        let record = VersionedRecord::tombstone(record_timestamp(&headers));
        return serve_local_write(coordinator.store().clone(), params.id, record, StatusCode::ACCEPTED)
            .await;
    }

    let target = match target(params, &coordinator) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };
    match coordinator.remove(&target.id, target.replicas).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(e) => {
            tracing::error!("DELETE {:?} failed: {}", target.id, e);
            error_response(&e)
        }
    }
}

/// Replica read: answer with the raw record so the coordinator can compare versions.
async fn serve_local_get(store: LocalStore, id: String) -> Response {
    let result = tokio::task::spawn_blocking(move || store.get_record(id.as_bytes())).await;
    match result {
        Ok(Ok(record)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            record.to_bytes(),
        )
            .into_response(),
        Ok(Err(StoreError::NotFound)) => error_response(&KvError::NotFound),
        Ok(Err(e)) => {
            tracing::error!("Replica read failed: {}", e);
            error_response(&KvError::from(e))
        }
        Err(e) => {
            tracing::error!("Replica read task failed: {}", e);
            error_response(&KvError::Storage(e.to_string()))
        }
    }
}

async fn serve_local_write(
    store: LocalStore,
    id: Option<String>,
    record: VersionedRecord,
    success: StatusCode,
) -> Response {
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return error_response(&KvError::InvalidRequest("query requires id".into()));
    };
    let result = tokio::task::spawn_blocking(move || store.upsert(id.as_bytes(), &record)).await;
    match result {
        Ok(Ok(())) => success.into_response(),
        Ok(Err(e)) => {
            tracing::error!("Replica write failed: {}", e);
            error_response(&KvError::from(e))
        }
        Err(e) => {
            tracing::error!("Replica write task failed: {}", e);
            error_response(&KvError::Storage(e.to_string()))
        }
    }
}

/// Chunked scan of this node's storage over `[start, end)`.
pub async fn handle_entities(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let Some(start) = params.start.filter(|s| !s.is_empty()) else {
        return error_response(&KvError::InvalidRequest("start parameter is required".into()));
    };
    let end = params.end.filter(|e| !e.is_empty());
    tracing::debug!("Range scan from {:?} to {:?}", start, end);

    let cursor = coordinator
        .store()
        .range(start.as_bytes(), end.as_deref().map(str::as_bytes));
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        open_stream(cursor),
    )
        .into_response()
}

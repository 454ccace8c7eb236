//! HTTP Service Module
//!
//! Exposes the node to clients and to its peers.
//!
//! ## Endpoints
//! - **`/v0/status`**: Liveness probe.
//! - **`/v0/entity`**: Replicated GET/PUT/DELETE, or a local-only replica operation when the
//!   service marker header is present.
//! - **`/v0/entities`**: Chunked range scan of this node's storage.

pub mod handlers;
pub mod stream;

use axum::{Extension, Router, routing::get};
use std::sync::Arc;

use crate::replication::Coordinator;
use crate::replication::protocol::{ENDPOINT_ENTITIES, ENDPOINT_ENTITY, ENDPOINT_STATUS};
use handlers::*;

pub fn router(coordinator: Arc<Coordinator>) -> Router {
    Router::new()
        .route(ENDPOINT_STATUS, get(handle_status))
        .route(
            ENDPOINT_ENTITY,
            get(handle_get).put(handle_put).delete(handle_delete),
        )
        .route(ENDPOINT_ENTITIES, get(handle_entities))
        .fallback(handle_default)
        .layer(Extension(coordinator))
}

//! Node-to-Node Protocol
//!
//! Endpoints and headers shared by client traffic and replica forwarding.
//!
//! Replica requests reuse the public entity endpoint. The service marker tells
//! the receiving node to serve from its own storage instead of replicating the
//! request again. A replica GET answers with the encoded
//! [`VersionedRecord`](crate::storage::VersionedRecord) so the coordinator can
//! compare versions.

// --- API Endpoints ---

/// Liveness probe.
pub const ENDPOINT_STATUS: &str = "/v0/status";
/// Single-key GET/PUT/DELETE, also used for replica forwarding.
pub const ENDPOINT_ENTITY: &str = "/v0/entity";
/// Chunked range scan served from the receiving node's storage.
pub const ENDPOINT_ENTITIES: &str = "/v0/entities";

// --- Headers ---

/// Marks a request as a replica sub-operation ("serve locally, do not re-replicate").
pub const HEADER_SERVICE_REQUEST: &str = "x-service-request";
/// Write timestamp (ms since epoch) chosen by the coordinator for this write.
pub const HEADER_RECORD_TIMESTAMP: &str = "x-record-timestamp";

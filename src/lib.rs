//! Replicated Key-Value Node Library
//!
//! This library crate defines the modules that make up a storage node.
//! It serves as the foundation for the binary executable (`main.rs`).
//!
//! ## Architecture Modules
//! - **`storage`**: The node-local layer. Versioned records with tombstones on top of an
//!   ordered byte engine (in memory or on disk), plus lazy range cursors.
//! - **`replication`**: The cluster layer. Deterministic partitioning of keys onto nodes,
//!   quorum aggregation of replica answers and last-write-wins reconciliation.
//! - **`service`**: The HTTP surface. Client endpoints, the replica-to-replica marker
//!   protocol and chunked range streaming.
//! - **`config`**: Command-line and environment settings of a node.
//! - **`error`**: Error kinds shared by the layers above.

pub mod config;
pub mod error;
pub mod replication;
pub mod service;
pub mod storage;

//! Node-Local Storage Module
//!
//! Persists versioned, tombstone-aware records on a single node.
//!
//! ## Core Concepts
//! - **Engine**: An opaque ordered byte store (`MemEngine` in memory, `FjallEngine` on disk).
//! - **Versioned Record**: Every write stores `tag ++ timestamp ++ value`; deletes store a tombstone.
//! - **Key Order**: Keys are transformed for signed-byte engines so scans follow unsigned order.
//! - **Range Cursor**: Lazy, paged iteration over live records with an explicit release.

pub mod engine;
pub mod fjall;
pub mod keys;
pub mod range;
pub mod record;
pub mod store;

pub use engine::{Collation, MemEngine, StorageEngine};
pub use fjall::FjallEngine;
pub use range::RangeCursor;
pub use record::{Record, VersionedRecord};
pub use store::LocalStore;

#[cfg(test)]
mod tests;

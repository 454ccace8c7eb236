//! Replication Module
//!
//! Spreads every key over several nodes and reconciles their answers.
//!
//! ## Core Concepts
//! - **Partitioning**: `Topology` hashes keys onto a fixed table of 1024 partitions dealt to nodes.
//! - **Preference List**: A key lives on `from` consecutive nodes starting at its partition owner.
//! - **Quorum**: A request succeeds once `ack` replicas answer, and fails once that becomes impossible.
//! - **Conflict Resolution**: Reads return the newest version across replicas (last write wins).

pub mod coordinator;
pub mod protocol;
pub mod quorum;
pub mod replicas;
pub mod topology;

pub use coordinator::{Coordinator, CoordinatorConfig, Replica};
pub use replicas::ReplicaFactor;
pub use topology::Topology;

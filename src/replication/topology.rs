use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Width of one partition in the signed 32-bit hash space.
const PARTITION_BITS: u32 = 22;
/// Number of equal partitions covering `i32::MIN..=i32::MAX`.
pub const PARTITION_COUNT: usize = 1 << (32 - PARTITION_BITS);

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("cluster topology is empty")]
    Empty,
    #[error("current node {0} is not a member of the topology")]
    NotAMember(String),
}

/// Static hash-ring partitioning of keys onto cluster nodes.
///
/// Nodes are sorted once at construction and partitions are dealt out to them
/// cyclically, so every process holding the same membership set computes the
/// same table.
#[derive(Debug, Clone)]
pub struct Topology {
    me: String,
    nodes: Vec<String>,
    /// Partition index -> position in `nodes`.
    partitions: Vec<usize>,
}

impl Topology {
    pub fn new<I, S>(me: &str, nodes: I) -> Result<Self, TopologyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes: Vec<String> = nodes
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if nodes.is_empty() {
            return Err(TopologyError::Empty);
        }
        if !nodes.iter().any(|n| n == me) {
            return Err(TopologyError::NotAMember(me.to_string()));
        }
        let partitions = (0..PARTITION_COUNT).map(|p| p % nodes.len()).collect();

        Ok(Self {
            me: me.to_string(),
            nodes,
            partitions,
        })
    }

    pub fn is_self(&self, node: &str) -> bool {
        self.me == node
    }

    /// All members in sorted order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn partition(&self, key: &[u8]) -> usize {
        partition_of(hash(key))
    }

    /// Primary owner of `key`.
    pub fn owner(&self, key: &[u8]) -> &str {
        &self.nodes[self.partitions[self.partition(key)]]
    }

    /// Preference list for `key`: `from` distinct nodes starting at the owner
    /// and walking the sorted node list with wrap-around. `from` is capped at
    /// the cluster size.
    pub fn replicas(&self, key: &[u8], from: usize) -> Vec<&str> {
        let start = self.partitions[self.partition(key)];
        (0..from.min(self.nodes.len()))
            .map(|step| self.nodes[(start + step) % self.nodes.len()].as_str())
            .collect()
    }
}

/// SHA-256 of the key, first four digest bytes read little-endian.
pub fn hash(key: &[u8]) -> i32 {
    let digest = Sha256::digest(key);
    i32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

fn partition_of(hash: i32) -> usize {
    ((hash as i64 - i32::MIN as i64) >> PARTITION_BITS) as usize
}

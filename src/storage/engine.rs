//! Ordered byte-keyed storage engines.
//!
//! The engine is treated as an opaque store: it persists raw key/value pairs
//! in its own native collation and is responsible for the thread-safety of
//! each individual call. Versioning, tombstones and key transforms live one
//! layer up in [`LocalStore`](super::store::LocalStore).

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use super::keys::signed_cmp;
use crate::error::StoreError;

/// Native key order of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collation {
    /// Bytes compare as `i8` (0x80..=0xff sort before 0x00).
    Signed,
    /// Bytes compare as `u8`.
    Unsigned,
}

/// Raw `(key, value)` pair as stored by an engine.
pub type RawEntry = (Vec<u8>, Vec<u8>);

pub trait StorageEngine: Send + Sync + 'static {
    fn collation(&self) -> Collation;

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// Reclaim space held by overwritten entries.
    fn compact(&self) -> Result<(), StoreError>;

    /// Return up to `limit` entries in native order, starting at `from`.
    ///
    /// Cursors page through a keyspace by passing the last key they saw as
    /// `Bound::Excluded`.
    fn scan(&self, from: Bound<&[u8]>, limit: usize) -> Result<Vec<RawEntry>, StoreError>;
}

/// Key wrapper ordering bytes as signed values.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignedKey(Vec<u8>);

impl Ord for SignedKey {
    fn cmp(&self, other: &Self) -> Ordering {
        signed_cmp(&self.0, &other.0)
    }
}

impl PartialOrd for SignedKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// In-memory engine using a signed-byte comparator.
///
/// Used when a node runs without a data directory and in tests.
#[derive(Default)]
pub struct MemEngine {
    entries: RwLock<BTreeMap<SignedKey, Vec<u8>>>,
}

impl MemEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageEngine for MemEngine {
    fn collation(&self) -> Collation {
        Collation::Signed
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.read().get(&SignedKey(key.to_vec())).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entries
            .write()
            .insert(SignedKey(key.to_vec()), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entries.write().remove(&SignedKey(key.to_vec()));
        Ok(())
    }

    fn compact(&self) -> Result<(), StoreError> {
        // Overwrites replace in place; nothing to reclaim.
        Ok(())
    }

    fn scan(&self, from: Bound<&[u8]>, limit: usize) -> Result<Vec<RawEntry>, StoreError> {
        let start = match from {
            Bound::Included(k) => Bound::Included(SignedKey(k.to_vec())),
            Bound::Excluded(k) => Bound::Excluded(SignedKey(k.to_vec())),
            Bound::Unbounded => Bound::Unbounded,
        };
        let entries = self.entries.read();
        Ok(entries
            .range((start, Bound::Unbounded))
            .take(limit)
            .map(|(k, v)| (k.0.clone(), v.clone()))
            .collect())
    }
}

use std::sync::Arc;

use super::engine::{Collation, StorageEngine};
use super::keys::to_engine_key;
use super::range::{DEFAULT_PAGE_SIZE, RangeCursor};
use super::record::{VersionedRecord, now_ms};
use crate::error::StoreError;

/// Per-node access to versioned records.
///
/// Cheap to clone; all clones share one engine handle. The engine provides
/// the thread-safety of individual calls, no extra locking is layered on top.
#[derive(Clone)]
pub struct LocalStore {
    engine: Arc<dyn StorageEngine>,
    collation: Collation,
}

impl LocalStore {
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        let collation = engine.collation();
        Self { engine, collation }
    }

    fn engine_key(&self, key: &[u8]) -> Vec<u8> {
        to_engine_key(self.collation, key)
    }

    /// Raw record for `key`, tombstones included.
    pub fn get_record(&self, key: &[u8]) -> Result<VersionedRecord, StoreError> {
        let bytes = self
            .engine
            .get(&self.engine_key(key))?
            .ok_or(StoreError::NotFound)?;
        VersionedRecord::from_bytes(&bytes)
    }

    /// Live value for `key`. Tombstoned keys are reported as not found.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.get_record(key)?
            .into_value()
            .ok_or(StoreError::NotFound)
    }

    /// Overwrite whatever is stored under `key`.
    pub fn upsert(&self, key: &[u8], record: &VersionedRecord) -> Result<(), StoreError> {
        self.engine.put(&self.engine_key(key), &record.to_bytes())
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.upsert(key, &VersionedRecord::live(value.to_vec(), now_ms()))
    }

    pub fn remove(&self, key: &[u8]) -> Result<(), StoreError> {
        self.remove_at(key, now_ms())
    }

    pub fn remove_at(&self, key: &[u8], timestamp: i64) -> Result<(), StoreError> {
        self.upsert(key, &VersionedRecord::tombstone(timestamp))
    }

    /// Live records with `start <= key < end` in ascending unsigned order.
    /// Without `end` the scan runs to the end of the keyspace.
    pub fn range(&self, start: &[u8], end: Option<&[u8]>) -> RangeCursor {
        self.range_with_page_size(start, end, DEFAULT_PAGE_SIZE)
    }

    pub fn range_with_page_size(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        page_size: usize,
    ) -> RangeCursor {
        RangeCursor::new(self.engine.clone(), start, end, page_size)
    }

    pub fn compact(&self) -> Result<(), StoreError> {
        self.engine.compact()
    }
}

use std::ops::Bound;
use std::path::Path;

use super::engine::{Collation, RawEntry, StorageEngine};
use crate::error::StoreError;

const KEYSPACE: &str = "entities";

fn fjall_err(e: fjall::Error) -> StoreError {
    StoreError::Io(e.to_string())
}

/// On-disk LSM engine backed by a single fjall keyspace.
///
/// fjall orders keys as unsigned bytes, so no key transform is applied.
pub struct FjallEngine {
    /// Kept open for the lifetime of the keyspace handle.
    _db: fjall::Database,
    entities: fjall::Keyspace,
}

impl FjallEngine {
    /// Open (or create) the engine at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = fjall::Database::builder(path).open().map_err(fjall_err)?;
        let entities = db
            .keyspace(KEYSPACE, fjall::KeyspaceCreateOptions::default)
            .map_err(fjall_err)?;
        tracing::info!("Opened fjall storage at {}", path.display());
        Ok(Self { _db: db, entities })
    }
}

impl StorageEngine for FjallEngine {
    fn collation(&self) -> Collation {
        Collation::Unsigned
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .entities
            .get(key)
            .map_err(fjall_err)?
            .map(|v| v.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.entities.insert(key, value).map_err(fjall_err)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.entities.remove(key).map_err(fjall_err)
    }

    /// No-op: fjall merges segments and drops shadowed versions in its
    /// background compaction workers, and exposes no public major compaction.
    fn compact(&self) -> Result<(), StoreError> {
        tracing::debug!("fjall compaction runs in the background");
        Ok(())
    }

    fn scan(&self, from: Bound<&[u8]>, limit: usize) -> Result<Vec<RawEntry>, StoreError> {
        let start: Bound<Vec<u8>> = match from {
            Bound::Included(k) => Bound::Included(k.to_vec()),
            Bound::Excluded(k) => Bound::Excluded(k.to_vec()),
            Bound::Unbounded => Bound::Unbounded,
        };
        self.entities
            .range((start, Bound::Unbounded))
            .take(limit)
            .map(|guard| {
                guard
                    .into_inner()
                    .map(|(k, v)| (k.to_vec(), v.to_vec()))
                    .map_err(fjall_err)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let engine = FjallEngine::open(dir.path()).unwrap();
            engine.put(b"k", b"v").unwrap();
        }
        let engine = FjallEngine::open(dir.path()).unwrap();
        assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn scan_is_unsigned_and_pages() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FjallEngine::open(dir.path()).unwrap();
        for key in [[0xffu8], [0x00], [0x80], [0x7f]] {
            engine.put(&key, b"").unwrap();
        }
        engine.delete(&[0x7f]).unwrap();

        let first = engine.scan(Bound::Included(&[0x00]), 2).unwrap();
        let keys: Vec<_> = first.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![vec![0x00], vec![0x80]]);

        let rest = engine.scan(Bound::Excluded(&[0x80]), 10).unwrap();
        let keys: Vec<_> = rest.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![vec![0xff]]);
    }
}

//! Storage Module Tests
//!
//! Validates the local store on top of both engines.
//!
//! ## Test Scopes
//! - **Versioned Records**: Put/Get round trips, tombstones and raw record access.
//! - **Range Scans**: Key order, bounds, tombstone skipping and cursor release.

#[cfg(test)]
mod tests {
    use crate::error::StoreError;
    use crate::storage::{FjallEngine, LocalStore, MemEngine, Record, VersionedRecord};
    use std::sync::Arc;

    fn mem_store() -> LocalStore {
        LocalStore::new(Arc::new(MemEngine::new()))
    }

    fn keys(records: Vec<Record>) -> Vec<Vec<u8>> {
        records.into_iter().map(|r| r.key).collect()
    }

    // ============================================================
    // VERSIONED RECORD TESTS
    // ============================================================

    #[test]
    fn test_put_then_get_returns_exact_bytes() {
        let store = mem_store();
        let value = vec![0x00, 0x80, 0xff, b'\n', b'v'];

        store.put(b"k1", &value).unwrap();

        assert_eq!(store.get(b"k1").unwrap(), value);
    }

    #[test]
    fn test_get_missing_key_is_not_found() {
        let store = mem_store();
        assert_eq!(store.get(b"nope"), Err(StoreError::NotFound));
        assert_eq!(store.get_record(b"nope"), Err(StoreError::NotFound));
    }

    #[test]
    fn test_upsert_overwrites_without_reading() {
        let store = mem_store();
        store.upsert(b"k", &VersionedRecord::live(b"old".to_vec(), 10)).unwrap();
        store.upsert(b"k", &VersionedRecord::live(b"new".to_vec(), 20)).unwrap();

        let record = store.get_record(b"k").unwrap();
        assert_eq!(record.value(), Some(&b"new"[..]));
        assert_eq!(record.timestamp(), 20);
    }

    #[test]
    fn test_remove_hides_value_but_keeps_tombstone() {
        let store = mem_store();
        store.put(b"k", b"v").unwrap();
        store.remove_at(b"k", 1234).unwrap();

        assert_eq!(store.get(b"k"), Err(StoreError::NotFound));

        let raw = store.get_record(b"k").unwrap();
        assert!(raw.is_tombstone());
        assert_eq!(raw.timestamp(), 1234);
    }

    #[test]
    fn test_double_remove_is_idempotent() {
        let store = mem_store();
        store.put(b"k", b"v").unwrap();

        store.remove(b"k").unwrap();
        store.remove(b"k").unwrap();

        assert_eq!(store.get(b"k"), Err(StoreError::NotFound));
        assert!(store.get_record(b"k").unwrap().is_tombstone());
    }

    #[test]
    fn test_put_after_remove_revives_key() {
        let store = mem_store();
        store.remove_at(b"k", 1).unwrap();
        store.upsert(b"k", &VersionedRecord::live(b"back".to_vec(), 2)).unwrap();
        assert_eq!(store.get(b"k").unwrap(), b"back".to_vec());
    }

    // ============================================================
    // RANGE SCAN TESTS
    // ============================================================

    #[test]
    fn test_range_skips_tombstones_and_excludes_end() {
        let store = mem_store();
        store.put(b"a", b"va").unwrap();
        store.put(b"b", b"vb").unwrap();
        store.put(b"c", b"vc").unwrap();
        store.remove(b"b").unwrap();

        let records: Vec<Record> = store
            .range(b"a", Some(&b"c"[..]))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            records,
            vec![Record {
                key: b"a".to_vec(),
                value: b"va".to_vec()
            }]
        );
    }

    #[test]
    fn test_range_without_end_scans_to_last_key() {
        let store = mem_store();
        for key in ["a", "b", "c", "d"] {
            store.put(key.as_bytes(), key.as_bytes()).unwrap();
        }

        let records: Vec<Record> = store.range(b"b", None).collect::<Result<_, _>>().unwrap();

        assert_eq!(keys(records), vec![b"b".to_vec(), b"c".to_vec(), b"d".to_vec()]);
    }

    #[test]
    fn test_range_with_end_before_start_is_empty() {
        let store = mem_store();
        store.put(b"a", b"1").unwrap();
        store.put(b"z", b"2").unwrap();

        let mut cursor = store.range(b"z", Some(&b"a"[..]));
        assert!(cursor.next().is_none());
        assert!(cursor.is_released());
    }

    #[test]
    fn test_range_follows_unsigned_byte_order() {
        let store = mem_store();
        let input: Vec<Vec<u8>> = vec![vec![0xff], vec![0x01], vec![0x80, 0x01], vec![0x7f], vec![0x80]];
        for key in &input {
            store.put(key, b"x").unwrap();
        }

        let records: Vec<Record> = store
            .range_with_page_size(&[0x00], None, 2)
            .collect::<Result<_, _>>()
            .unwrap();

        let mut expected = input.clone();
        expected.sort();
        assert_eq!(keys(records), expected);
    }

    #[test]
    fn test_range_seek_lands_on_high_bytes() {
        let store = mem_store();
        store.put(&[0x10], b"low").unwrap();
        store.put(&[0x90], b"high").unwrap();
        store.put(&[0xf0], b"top").unwrap();

        let records: Vec<Record> = store
            .range(&[0x80], Some(&[0xf0][..]))
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(keys(records), vec![vec![0x90]]);
    }

    #[test]
    fn test_range_pages_across_tombstone_runs() {
        let store = mem_store();
        for i in 0..20u8 {
            store.put(&[b'k', i], &[i]).unwrap();
        }
        for i in 1..19u8 {
            store.remove(&[b'k', i]).unwrap();
        }

        let records: Vec<Record> = store
            .range_with_page_size(b"k", None, 3)
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(keys(records), vec![vec![b'k', 0], vec![b'k', 19]]);
    }

    #[test]
    fn test_cursor_release_is_idempotent_and_stops_iteration() {
        let store = mem_store();
        store.put(b"a", b"1").unwrap();
        store.put(b"b", b"2").unwrap();

        let mut cursor = store.range(b"a", None);
        assert!(cursor.next().is_some());

        cursor.release();
        cursor.release();

        assert!(cursor.is_released());
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_corrupt_entry_surfaces_as_io_failure() {
        use crate::storage::StorageEngine;
        use crate::storage::keys::to_engine_key;

        let engine = Arc::new(MemEngine::new());
        engine
            .put(&to_engine_key(engine.collation(), b"bad"), b"?")
            .unwrap();
        let store = LocalStore::new(engine);

        assert!(matches!(store.get(b"bad"), Err(StoreError::Io(_))));

        let mut cursor = store.range(b"a", None);
        assert!(matches!(cursor.next(), Some(Err(StoreError::Io(_)))));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_fjall_store_matches_memory_semantics() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(Arc::new(FjallEngine::open(dir.path()).unwrap()));

        store.put(&[0xff], b"hi").unwrap();
        store.put(&[0x01], b"lo").unwrap();
        store.put(b"gone", b"x").unwrap();
        store.remove(b"gone").unwrap();
        store.compact().unwrap();

        assert_eq!(store.get(&[0xff]).unwrap(), b"hi".to_vec());
        assert_eq!(store.get(b"gone"), Err(StoreError::NotFound));

        let records: Vec<Record> = store.range(&[0x00], None).collect::<Result<_, _>>().unwrap();
        assert_eq!(keys(records), vec![vec![0x01], vec![0xff]]);
    }
}

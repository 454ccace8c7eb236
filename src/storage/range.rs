use std::collections::VecDeque;
use std::ops::Bound;
use std::sync::Arc;

use super::engine::{Collation, RawEntry, StorageEngine};
use super::keys::{from_engine_key, to_engine_key};
use super::record::{Record, VersionedRecord};
use crate::error::StoreError;

/// Entries fetched from the engine per page.
pub const DEFAULT_PAGE_SIZE: usize = 256;

/// Lazy, ascending scan over live records in `[start, end)`.
///
/// The cursor holds a handle on the engine until it is exhausted or
/// [`release`](RangeCursor::release)d. Dropping the cursor releases it too.
pub struct RangeCursor {
    engine: Option<Arc<dyn StorageEngine>>,
    collation: Collation,
    /// Position of the next engine page, in engine key space.
    position: Bound<Vec<u8>>,
    end: Option<Vec<u8>>,
    page: VecDeque<RawEntry>,
    page_size: usize,
}

impl RangeCursor {
    pub(crate) fn new(
        engine: Arc<dyn StorageEngine>,
        start: &[u8],
        end: Option<&[u8]>,
        page_size: usize,
    ) -> Self {
        let collation = engine.collation();
        let empty = matches!(end, Some(end) if end <= start);
        Self {
            engine: if empty { None } else { Some(engine) },
            collation,
            position: Bound::Included(to_engine_key(collation, start)),
            end: end.map(<[u8]>::to_vec),
            page: VecDeque::new(),
            page_size: page_size.max(1),
        }
    }

    /// Drop the engine handle and any buffered entries. Idempotent.
    pub fn release(&mut self) {
        if self.engine.take().is_some() {
            tracing::debug!("Range cursor released");
        }
        self.page.clear();
    }

    pub fn is_released(&self) -> bool {
        self.engine.is_none()
    }

    fn fill_page(&mut self) -> Result<bool, StoreError> {
        let Some(engine) = &self.engine else {
            return Ok(false);
        };
        let from = match &self.position {
            Bound::Included(k) => Bound::Included(k.as_slice()),
            Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
            Bound::Unbounded => Bound::Unbounded,
        };
        let entries = engine.scan(from, self.page_size)?;
        if let Some((last, _)) = entries.last() {
            self.position = Bound::Excluded(last.clone());
        }
        let fetched = !entries.is_empty();
        self.page.extend(entries);
        Ok(fetched)
    }
}

impl Iterator for RangeCursor {
    type Item = Result<Record, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.page.is_empty() {
                match self.fill_page() {
                    Ok(true) => {}
                    Ok(false) => {
                        self.release();
                        return None;
                    }
                    Err(e) => {
                        self.release();
                        return Some(Err(e));
                    }
                }
            }

            let (raw_key, raw_value) = self.page.pop_front()?;
            let key = from_engine_key(self.collation, &raw_key);
            if let Some(end) = &self.end
                && key.as_slice() >= end.as_slice()
            {
                self.release();
                return None;
            }

            match VersionedRecord::from_bytes(&raw_value) {
                Ok(record) => {
                    if let Some(value) = record.into_value() {
                        return Some(Ok(Record { key, value }));
                    }
                }
                Err(e) => {
                    self.release();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl Drop for RangeCursor {
    fn drop(&mut self) {
        self.release();
    }
}

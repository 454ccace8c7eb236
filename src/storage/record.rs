use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::StoreError;

const TAG_LIVE: u8 = b'e';
const TAG_TOMBSTONE: u8 = b'd';
const HEADER_LEN: usize = 1 + 8;

/// A value together with its write timestamp and deletion marker.
///
/// Every write produces a fresh record; deletes write a tombstone instead of
/// removing the stored entry so replicas can still compare versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedRecord {
    value: Vec<u8>,
    timestamp: i64,
    tombstone: bool,
}

impl VersionedRecord {
    pub fn live(value: Vec<u8>, timestamp: i64) -> Self {
        Self {
            value,
            timestamp,
            tombstone: false,
        }
    }

    pub fn tombstone(timestamp: i64) -> Self {
        Self {
            value: Vec::new(),
            timestamp,
            tombstone: true,
        }
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_tombstone(&self) -> bool {
        self.tombstone
    }

    /// The stored value, or `None` for a tombstone.
    pub fn value(&self) -> Option<&[u8]> {
        if self.tombstone {
            None
        } else {
            Some(&self.value)
        }
    }

    pub fn into_value(self) -> Option<Vec<u8>> {
        if self.tombstone { None } else { Some(self.value) }
    }

    /// `tag(1) ++ timestamp_be(8) ++ value`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.value.len());
        buf.push(if self.tombstone { TAG_TOMBSTONE } else { TAG_LIVE });
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&self.value);
        buf
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.len() < HEADER_LEN {
            return Err(StoreError::Io(format!(
                "corrupt record: {} bytes, need at least {}",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let ts: [u8; 8] = bytes[1..HEADER_LEN]
            .try_into()
            .map_err(|_| StoreError::Io("corrupt record timestamp".into()))?;
        let timestamp = i64::from_be_bytes(ts);
        let value = &bytes[HEADER_LEN..];

        match bytes[0] {
            TAG_LIVE => Ok(Self::live(value.to_vec(), timestamp)),
            TAG_TOMBSTONE if value.is_empty() => Ok(Self::tombstone(timestamp)),
            TAG_TOMBSTONE => Err(StoreError::Io("corrupt record: tombstone carries a value".into())),
            tag => Err(StoreError::Io(format!("corrupt record: unknown tag {:#04x}", tag))),
        }
    }
}

/// A live key-value pair produced by range scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

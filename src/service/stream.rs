//! Streaming Range Session
//!
//! Delivers a range scan as a chunked HTTP body, one record per chunk.
//!
//! The producer task owns the [`RangeCursor`]. It reserves the single slot of
//! the channel feeding the response body before pulling the next record, so
//! nothing is read from storage while a chunk is still waiting for the
//! transport. Chunk length prefixes and the terminating zero-length chunk come
//! from the HTTP/1.1 chunked encoding of the streamed body.

use std::io;

use axum::body::Body;
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::storage::{RangeCursor, Record};

/// Separates key and value inside a chunk.
pub const DELIMITER: u8 = b'\n';

/// Chunk payload: `key ++ '\n' ++ value`.
pub fn encode_chunk(record: &Record) -> Bytes {
    let mut buf = BytesMut::with_capacity(record.key.len() + 1 + record.value.len());
    buf.put_slice(&record.key);
    buf.put_u8(DELIMITER);
    buf.put_slice(&record.value);
    buf.freeze()
}

/// Start streaming `cursor` and return the response body fed by it.
pub fn open_stream(cursor: RangeCursor) -> Body {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(1);
    tokio::spawn(pump(cursor, tx));
    Body::from_stream(ReceiverStream::new(rx))
}

async fn pump(mut cursor: RangeCursor, tx: mpsc::Sender<io::Result<Bytes>>) {
    let mut sent = 0usize;
    loop {
        // Waits until the previous chunk has been taken by the transport.
        let Ok(permit) = tx.reserve().await else {
            tracing::debug!("Range stream closed by peer after {} records", sent);
            break;
        };
        // Pulling a record may read a page from disk.
        let pulled = tokio::task::spawn_blocking(move || {
            let next = cursor.next();
            (cursor, next)
        })
        .await;
        let next = match pulled {
            Ok((returned, next)) => {
                cursor = returned;
                next
            }
            Err(e) => {
                tracing::error!("Range stream aborted after {} records: {}", sent, e);
                permit.send(Err(io::Error::other(e.to_string())));
                return;
            }
        };
        match next {
            Some(Ok(record)) => {
                permit.send(Ok(encode_chunk(&record)));
                sent += 1;
            }
            Some(Err(e)) => {
                tracing::error!("Range stream aborted after {} records: {}", sent, e);
                permit.send(Err(io::Error::other(e.to_string())));
                break;
            }
            None => {
                tracing::debug!("Range stream finished with {} records", sent);
                break;
            }
        }
    }
    cursor.release();
}

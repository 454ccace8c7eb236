//! Quorum aggregation over concurrently running sub-operations.
//!
//! [`fan_out`] spawns one task per operation, each reporting into a shared
//! channel. [`gather`] is the single consumer deciding the outcome as soon as
//! either threshold is crossed. Tasks still running afterwards are left alone;
//! their results are discarded when the receiver is gone.

use std::fmt::Display;
use std::future::Future;

use tokio::sync::mpsc;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("insufficient replicas: {failed} of {total} failed, {ack} successes required")]
pub struct QuorumError {
    pub ack: usize,
    pub total: usize,
    pub failed: usize,
}

/// Spawn every operation and return the channel their outcomes arrive on.
pub fn fan_out<F, T, E>(operations: Vec<F>) -> mpsc::Receiver<Result<T, E>>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = mpsc::channel(operations.len().max(1));
    for operation in operations {
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = operation.await;
            // Receiver is dropped once the quorum is decided.
            let _ = tx.send(outcome).await;
        });
    }
    rx
}

/// Wait until `ack` of `total` outcomes succeed, or more than `total - ack` fail.
///
/// On success, returns every success observed up to that point.
pub async fn gather<T, E>(
    mut outcomes: mpsc::Receiver<Result<T, E>>,
    total: usize,
    ack: usize,
) -> Result<Vec<T>, QuorumError>
where
    E: Display,
{
    let tolerated = total.saturating_sub(ack);
    let mut successes = Vec::with_capacity(ack);
    let mut failed = 0usize;

    while let Some(outcome) = outcomes.recv().await {
        match outcome {
            Ok(value) => {
                successes.push(value);
                if successes.len() >= ack {
                    return Ok(successes);
                }
            }
            Err(e) => {
                failed += 1;
                tracing::warn!("Sub-operation failed ({}/{} tolerated): {}", failed, tolerated, e);
                if failed > tolerated {
                    return Err(QuorumError { ack, total, failed });
                }
            }
        }
    }

    // Every sender went away short of `ack`; count the silent ones as failed.
    Err(QuorumError {
        ack,
        total,
        failed: total - successes.len(),
    })
}

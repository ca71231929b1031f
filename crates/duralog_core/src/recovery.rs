//! Crash recovery: rebuilding state from the log.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::adapter::DurableState;
use crate::error::{CoreError, CoreResult};
use crate::log::{LogWriter, Record};
use crate::types::{SequenceNumber, TransactionId};

/// Outcome of a recovery pass.
#[derive(Debug)]
pub struct Recovered<S> {
    /// State as of the last committed transaction.
    pub state: S,
    /// Logical end of the log: offset one past the last valid chunk.
    pub log_end: u64,
    /// Highest transaction ID observed, committed or not. Fresh
    /// transactions must start after it so IDs are never reused.
    pub last_txid: TransactionId,
    /// Sequence of the last committed transaction, zero if none.
    pub last_seq: SequenceNumber,
    /// Offset one past the snapshot the state was seeded from, zero if
    /// recovery started from the initial state. Growth-based snapshot
    /// policies measure from here.
    pub snapshot_base: u64,
}

/// Rebuilds state from the log, starting from `initial` when the log
/// holds no usable snapshot.
///
/// Recovery runs in two passes:
///
/// 1. Scan the whole valid prefix, noting every snapshot record and the
///    highest transaction ID and sequence number. The scan's final
///    position is the logical end of the log.
/// 2. Seed the state from the newest snapshot that deserializes
///    (falling back snapshot by snapshot, then to `initial`), and
///    replay from there: mutations are buffered per transaction and
///    applied only when that transaction's commit marker is reached, in
///    marker order. Mutations whose marker never arrives are dropped.
///
/// Afterwards the log is truncated to its logical end, so the torn tail
/// of a crashed write does not survive into the next generation of
/// appends.
///
/// Recovery is idempotent: recovering an already-recovered log yields
/// the same state.
///
/// # Errors
///
/// Returns an error if the backend fails, or if applying a committed
/// mutation fails (a [`DurableState`] contract violation - committed
/// history must always replay).
pub fn recover<S: DurableState>(log: &LogWriter, initial: S) -> CoreResult<Recovered<S>> {
    let mut snapshots: Vec<(u64, SequenceNumber, Vec<u8>)> = Vec::new();
    let mut last_txid = TransactionId::new(0);
    let mut last_seq = SequenceNumber::new(0);

    let log_end = {
        let mut scanner = log.scan()?;
        while let Some((_, record)) = scanner.next() {
            if let Some(txid) = record.txid() {
                last_txid = last_txid.max(txid);
            }
            match record {
                Record::Commit { sequence, .. } => last_seq = last_seq.max(sequence),
                Record::Snapshot { sequence, state } => {
                    last_seq = last_seq.max(sequence);
                    snapshots.push((scanner.position(), sequence, state));
                }
                Record::Mutation { .. } => {}
            }
        }
        // A read failure means the scan's end is not the log's end;
        // truncating there would destroy durable history. Bail instead.
        scanner.take_error()?;
        scanner.position()
    };

    // Newest snapshot that still deserializes wins. A snapshot that was
    // durably written but later damaged on the medium just means more
    // replay work, not failure.
    let mut state = initial;
    let mut replay_from = 0;
    let mut snapshot_base = 0;
    for (end, sequence, bytes) in snapshots.iter().rev() {
        match S::deserialize(bytes) {
            Ok(s) => {
                state = s;
                replay_from = *end;
                snapshot_base = *end;
                debug!(seq = %sequence, offset = end, "recovering from snapshot");
                break;
            }
            Err(e) => {
                let err = CoreError::corrupt_snapshot(e.to_string());
                warn!(seq = %sequence, error = %err, "falling back past unusable snapshot");
            }
        }
    }

    let mut pending: HashMap<TransactionId, Vec<Vec<u8>>> = HashMap::new();
    let mut replayed = 0usize;
    {
        let mut scanner = log.scan_from(replay_from)?;
        while let Some((_, record)) = scanner.next() {
            match record {
                Record::Mutation { txid, data } => {
                    pending.entry(txid).or_default().push(data);
                }
                Record::Commit { txid, .. } => {
                    for mutation in pending.remove(&txid).unwrap_or_default() {
                        state.apply(&mutation)?;
                    }
                    replayed += 1;
                }
                Record::Snapshot { .. } => {}
            }
        }
        scanner.take_error()?;
    }
    if !pending.is_empty() {
        debug!(
            discarded = pending.len(),
            "dropped transactions with no commit marker"
        );
    }

    let physical = log.size()?;
    if log_end < physical {
        info!(
            log_end,
            torn = physical - log_end,
            "truncating torn tail after recovery"
        );
        log.truncate(log_end)?;
    }

    info!(replayed, log_end, last_seq = %last_seq, "recovery complete");
    Ok(Recovered {
        state,
        log_end,
        last_txid,
        last_seq,
        snapshot_base,
    })
}

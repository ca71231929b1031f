//! Log record types and serialization.
//!
//! Records live inside chunk payloads. The first payload byte is the
//! record kind; the rest is kind-specific, little-endian encoded.

use crate::types::{SequenceNumber, TransactionId};

/// Type of log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecordKind {
    /// One caller-opaque mutation belonging to a transaction.
    Mutation = 1,
    /// Commit marker: the transaction whose mutations precede it is
    /// durable and complete.
    Commit = 2,
    /// Full-state checkpoint.
    Snapshot = 3,
}

impl RecordKind {
    /// Converts a byte to a record kind.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Mutation),
            2 => Some(Self::Commit),
            3 => Some(Self::Snapshot),
            _ => None,
        }
    }

    /// Converts the record kind to a byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A record in the append-only log.
///
/// Mutations carry opaque caller bytes and are meaningless on their own:
/// only a later [`Record::Commit`] marker for the same transaction makes
/// them part of durable history. A transaction whose commit marker never
/// made it to the log is discarded wholesale during recovery, which is
/// how partial transactions are told apart from complete ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// One mutation staged by a transaction.
    Mutation {
        /// Owning transaction.
        txid: TransactionId,
        /// Caller-opaque serialized mutation.
        data: Vec<u8>,
    },

    /// Commit marker for a transaction.
    Commit {
        /// Committed transaction.
        txid: TransactionId,
        /// Sequence number assigned to this commit.
        sequence: SequenceNumber,
    },

    /// Full serialized state at a point in the log.
    ///
    /// Every chunk before the most recent valid snapshot is logically
    /// superseded and safe to discard.
    Snapshot {
        /// Committed sequence the state reflects.
        sequence: SequenceNumber,
        /// Caller-opaque serialized full state.
        state: Vec<u8>,
    },
}

impl Record {
    /// Returns the record kind.
    #[must_use]
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Mutation { .. } => RecordKind::Mutation,
            Self::Commit { .. } => RecordKind::Commit,
            Self::Snapshot { .. } => RecordKind::Snapshot,
        }
    }

    /// Returns the transaction ID if this record belongs to one.
    #[must_use]
    pub fn txid(&self) -> Option<TransactionId> {
        match self {
            Self::Mutation { txid, .. } | Self::Commit { txid, .. } => Some(*txid),
            Self::Snapshot { .. } => None,
        }
    }

    /// Serializes the record into a chunk payload.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(self.kind().as_byte());

        match self {
            Self::Mutation { txid, data } => {
                buf.extend_from_slice(&txid.as_u64().to_le_bytes());
                buf.extend_from_slice(data);
            }

            Self::Commit { txid, sequence } => {
                buf.extend_from_slice(&txid.as_u64().to_le_bytes());
                buf.extend_from_slice(&sequence.as_u64().to_le_bytes());
            }

            Self::Snapshot { sequence, state } => {
                buf.extend_from_slice(&sequence.as_u64().to_le_bytes());
                buf.extend_from_slice(state);
            }
        }

        buf
    }

    /// Deserializes a record from a chunk payload.
    ///
    /// Returns `None` for an unknown kind, a missing field, or trailing
    /// bytes in a fixed-size record. The scanner treats `None` as end of
    /// log, consistent with the conservative-truncation policy.
    #[must_use]
    pub fn decode(payload: &[u8]) -> Option<Self> {
        let (&kind_byte, rest) = payload.split_first()?;
        let kind = RecordKind::from_byte(kind_byte)?;

        let read_u64 = |bytes: &[u8]| -> Option<u64> {
            Some(u64::from_le_bytes(bytes.get(..8)?.try_into().ok()?))
        };

        match kind {
            RecordKind::Mutation => {
                let txid = TransactionId::new(read_u64(rest)?);
                let data = rest[8..].to_vec();
                Some(Self::Mutation { txid, data })
            }

            RecordKind::Commit => {
                if rest.len() != 16 {
                    return None;
                }
                let txid = TransactionId::new(read_u64(rest)?);
                let sequence = SequenceNumber::new(read_u64(&rest[8..])?);
                Some(Self::Commit { txid, sequence })
            }

            RecordKind::Snapshot => {
                let sequence = SequenceNumber::new(read_u64(rest)?);
                let state = rest[8..].to_vec();
                Some(Self::Snapshot { sequence, state })
            }
        }
    }
}

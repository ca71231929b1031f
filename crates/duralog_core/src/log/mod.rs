//! Append-only log: chunk framing, record encoding, writer, and scanner.
//!
//! The log is the foundation of Duralog's durability guarantees. All
//! mutations are framed into checksummed chunks and appended before they
//! are applied in memory. On crash, the log is replayed to recover
//! committed transactions.
//!
//! ## Chunk Format
//!
//! ```text
//! | length (u32 LE) | payload (length bytes) | crc32 (u32 LE) |
//! ```
//!
//! The CRC covers `length || payload`. The first payload byte is a record
//! kind discriminant (see [`Record`]); everything after it belongs to the
//! record layer.
//!
//! ## Recovery Policy: conservative truncation
//!
//! The scanner treats *every* invalid condition as a clean end of log:
//!
//! - truncated length, payload, or checksum (fewer bytes than the chunk
//!   claims)
//! - checksum mismatch
//! - unknown record kind or undecodable record payload
//!
//! No atomicity is assumed of the medium above some small hardware unit,
//! so a crash mid-write legitimately leaves any of these shapes at the
//! tail. Once one invalid chunk is seen, everything after it is ignored,
//! even bytes that would happen to decode: ordering and adjacency are
//! what make the log meaningful, and a torn write must never let recovery
//! skip ahead and resurrect stale data.
//!
//! A backend *read failure* is not an invalid chunk: the bytes may be
//! intact and merely unreadable at that moment. The scanner stops but
//! reports the failure through [`Scanner::take_error`], and recovery
//! propagates it rather than truncating valid history at the failure
//! point.
//!
//! ## Invariants
//!
//! - The log is **append-only** - chunks are never modified after write
//! - The logical log length is the longest codec-valid prefix, regardless
//!   of how many bytes are physically present
//! - A valid prefix is always a consistent view of applied history
//! - Replay is **idempotent** - multiple replays produce the same state

pub mod frame;
mod record;
mod scanner;
mod writer;

pub use record::{Record, RecordKind};
pub use scanner::Scanner;
pub use writer::LogWriter;

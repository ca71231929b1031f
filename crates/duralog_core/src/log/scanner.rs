//! Streaming log scanner.

use crate::error::{CoreError, CoreResult};
use crate::log::frame;
use crate::log::record::Record;
use duralog_storage::StorageBackend;
use parking_lot::MutexGuard;
use tracing::warn;

/// Initial read buffer size. Grows if a chunk exceeds it.
const BUFFER_SIZE: usize = 64 * 1024;

/// Streaming iterator over the valid prefix of the log.
///
/// Yields `(offset, record)` pairs in log order. Scanning stops at the
/// first invalid condition - truncated chunk, checksum mismatch, or
/// undecodable record - which is the conservative-truncation boundary,
/// not an error. After exhaustion, [`Scanner::position`] reports the
/// offset one past the last valid chunk; everything at or after it is a
/// torn tail the caller may discard.
///
/// A backend read failure is a different animal: the bytes may be
/// perfectly valid and merely unreadable right now. The scan still
/// stops, but the failure is held and surfaced by
/// [`Scanner::take_error`]; callers that truncate at [`Scanner::position`]
/// must check it first or they would destroy durable history.
///
/// The scanner holds the log lock for its lifetime, so no appends can
/// interleave with a scan.
pub struct Scanner<'a> {
    backend: MutexGuard<'a, Box<dyn StorageBackend>>,
    total_size: u64,
    /// Absolute log offset of the next unparsed byte (`buffer[buf_pos]`).
    offset: u64,
    buffer: Vec<u8>,
    buf_pos: usize,
    buf_len: usize,
    finished: bool,
    error: Option<CoreError>,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner starting at `offset`, which must be a chunk
    /// boundary (0 or an offset previously yielded by a scan).
    pub(crate) fn new(
        backend: MutexGuard<'a, Box<dyn StorageBackend>>,
        offset: u64,
    ) -> CoreResult<Self> {
        let total_size = backend.size()?;
        Ok(Self {
            backend,
            total_size,
            offset,
            buffer: vec![0; BUFFER_SIZE],
            buf_pos: 0,
            buf_len: 0,
            finished: offset >= total_size,
            error: None,
        })
    }

    /// Offset one past the last valid chunk yielded so far.
    ///
    /// After the scanner is exhausted this is the logical end of the
    /// log: truncating to it discards exactly the torn tail.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.offset
    }

    /// Takes the backend read error that ended the scan, if any.
    ///
    /// `Ok` means the scan genuinely reached the end of the valid log
    /// prefix. `Err` means the scan ended because the backend failed to
    /// read; [`Scanner::position`] then points at the failure, not at
    /// the logical end of the log.
    pub fn take_error(&mut self) -> CoreResult<()> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Ensures at least `needed` unparsed bytes are buffered.
    ///
    /// Returns `false` if the log ends first or a read fails; a read
    /// failure is additionally recorded for [`Scanner::take_error`].
    fn ensure(&mut self, needed: usize) -> bool {
        loop {
            if self.buf_len - self.buf_pos >= needed {
                return true;
            }

            // A corrupt length prefix can claim far more bytes than the
            // log holds; bail before sizing a buffer to it.
            if (self.total_size - self.offset) < needed as u64 {
                return false;
            }

            if needed > self.buffer.len() {
                self.buffer.resize(needed.next_power_of_two(), 0);
            }

            // Slide the unparsed remainder to the front so the whole
            // buffer is available for the next read.
            if self.buf_pos > 0 {
                self.buffer.copy_within(self.buf_pos..self.buf_len, 0);
                self.buf_len -= self.buf_pos;
                self.buf_pos = 0;
            }

            let read_offset = self.offset + self.buf_len as u64;
            if read_offset >= self.total_size {
                return false;
            }
            let want =
                (self.buffer.len() - self.buf_len).min((self.total_size - read_offset) as usize);

            match self.backend.read_at(read_offset, want) {
                Ok(bytes) => {
                    if bytes.is_empty() {
                        return false;
                    }
                    self.buffer[self.buf_len..self.buf_len + bytes.len()]
                        .copy_from_slice(&bytes);
                    self.buf_len += bytes.len();
                }
                Err(e) => {
                    warn!(offset = read_offset, error = %e, "log read failed, stopping scan");
                    self.error = Some(e.into());
                    return false;
                }
            }
        }
    }

    fn next_record(&mut self) -> Option<(u64, Record)> {
        if self.finished {
            return None;
        }

        if !self.ensure(frame::LENGTH_SIZE) {
            self.finished = true;
            return None;
        }
        let payload_len = frame::read_length(&self.buffer[self.buf_pos..]);
        let Some(total) = frame::LENGTH_SIZE
            .checked_add(payload_len)
            .and_then(|n| n.checked_add(frame::CRC_SIZE))
        else {
            self.finished = true;
            return None;
        };
        if !self.ensure(total) {
            self.finished = true;
            return None;
        }

        let chunk = &self.buffer[self.buf_pos..self.buf_pos + total];
        let Some(payload) = frame::verify(chunk) else {
            warn!(offset = self.offset, "checksum mismatch, treating as end of log");
            self.finished = true;
            return None;
        };
        let Some(record) = Record::decode(payload) else {
            warn!(offset = self.offset, "undecodable record, treating as end of log");
            self.finished = true;
            return None;
        };

        let chunk_offset = self.offset;
        self.buf_pos += total;
        self.offset += total as u64;
        Some((chunk_offset, record))
    }
}

impl Iterator for Scanner<'_> {
    type Item = (u64, Record);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
    }
}

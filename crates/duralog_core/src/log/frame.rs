//! Chunk framing: the self-describing, self-verifying unit of the log.
//!
//! A chunk is either fully present and checksum-valid, or it is treated
//! as entirely absent. There is no partially-valid chunk state. This
//! converts "was this write atomic?" into a locally verifiable property,
//! independent of what the storage device guarantees.

use crate::error::{CoreError, CoreResult};

/// Size of the length prefix.
pub const LENGTH_SIZE: usize = 4;

/// Size of the trailing CRC32.
pub const CRC_SIZE: usize = 4;

/// Result of decoding bytes at a chunk boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete, checksum-valid chunk.
    Chunk {
        /// The chunk payload.
        payload: Vec<u8>,
        /// Total bytes consumed, including framing.
        consumed: usize,
    },
    /// No valid chunk starts here. This is the end of the durable log,
    /// not an error: it is the expected shape of a crash mid-write.
    End,
}

/// Encodes a payload into a framed chunk: `length || payload || crc32`.
///
/// The CRC covers `length || payload`. Zero-length payloads are valid.
///
/// # Errors
///
/// Returns an error if the payload exceeds `u32::MAX` bytes.
pub fn encode(payload: &[u8]) -> CoreResult<Vec<u8>> {
    let len = u32::try_from(payload.len())
        .map_err(|_| CoreError::invalid_operation("chunk payload too large"))?;

    let mut buf = Vec::with_capacity(LENGTH_SIZE + payload.len() + CRC_SIZE);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());
    Ok(buf)
}

/// Reads the payload length from the first [`LENGTH_SIZE`] bytes.
///
/// Callers must ensure `bytes` holds at least [`LENGTH_SIZE`] bytes.
pub(crate) fn read_length(bytes: &[u8]) -> usize {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
}

/// Verifies a complete chunk (framing included) and returns its payload.
///
/// Returns `None` on checksum mismatch.
pub(crate) fn verify(chunk: &[u8]) -> Option<&[u8]> {
    let body_len = chunk.len() - CRC_SIZE;
    let stored = u32::from_le_bytes(chunk[body_len..].try_into().ok()?);
    let computed = crc32fast::hash(&chunk[..body_len]);
    if stored == computed {
        Some(&chunk[LENGTH_SIZE..body_len])
    } else {
        None
    }
}

/// Decodes the chunk starting at the beginning of `bytes`.
///
/// `bytes` must extend to the physical end of the log; a chunk whose
/// framing claims more bytes than are available is `End`.
pub fn decode(bytes: &[u8]) -> Decoded {
    if bytes.len() < LENGTH_SIZE {
        return Decoded::End;
    }

    let payload_len = read_length(bytes);
    let Some(total) = LENGTH_SIZE
        .checked_add(payload_len)
        .and_then(|n| n.checked_add(CRC_SIZE))
    else {
        return Decoded::End;
    };
    if bytes.len() < total {
        return Decoded::End;
    }

    match verify(&bytes[..total]) {
        Some(payload) => Decoded::Chunk {
            payload: payload.to_vec(),
            consumed: total,
        },
        None => Decoded::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let encoded = encode(b"hello").unwrap();
        assert_eq!(encoded.len(), LENGTH_SIZE + 5 + CRC_SIZE);

        match decode(&encoded) {
            Decoded::Chunk { payload, consumed } => {
                assert_eq!(payload, b"hello");
                assert_eq!(consumed, encoded.len());
            }
            Decoded::End => panic!("expected chunk"),
        }
    }

    #[test]
    fn empty_payload_is_valid() {
        let encoded = encode(b"").unwrap();
        match decode(&encoded) {
            Decoded::Chunk { payload, consumed } => {
                assert!(payload.is_empty());
                assert_eq!(consumed, LENGTH_SIZE + CRC_SIZE);
            }
            Decoded::End => panic!("expected chunk"),
        }
    }

    #[test]
    fn empty_input_is_end() {
        assert_eq!(decode(b""), Decoded::End);
    }

    #[test]
    fn truncated_length_is_end() {
        let encoded = encode(b"data").unwrap();
        assert_eq!(decode(&encoded[..3]), Decoded::End);
    }

    #[test]
    fn truncated_payload_is_end() {
        let encoded = encode(b"some payload").unwrap();
        assert_eq!(decode(&encoded[..LENGTH_SIZE + 4]), Decoded::End);
    }

    #[test]
    fn truncated_checksum_is_end() {
        let encoded = encode(b"some payload").unwrap();
        assert_eq!(decode(&encoded[..encoded.len() - 1]), Decoded::End);
    }

    #[test]
    fn every_truncation_point_is_end() {
        let encoded = encode(b"payload under test").unwrap();
        for cut in 0..encoded.len() {
            assert_eq!(decode(&encoded[..cut]), Decoded::End, "cut at {cut}");
        }
    }

    #[test]
    fn bit_flip_in_payload_is_end() {
        let mut encoded = encode(b"sensitive bytes").unwrap();
        encoded[LENGTH_SIZE + 2] ^= 0x40;
        assert_eq!(decode(&encoded), Decoded::End);
    }

    #[test]
    fn bit_flip_in_length_is_end() {
        let mut encoded = encode(b"sensitive bytes").unwrap();
        encoded[0] ^= 0x01;
        assert_eq!(decode(&encoded), Decoded::End);
    }

    #[test]
    fn bit_flip_in_checksum_is_end() {
        let mut encoded = encode(b"sensitive bytes").unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0x80;
        assert_eq!(decode(&encoded), Decoded::End);
    }

    #[test]
    fn trailing_garbage_does_not_affect_first_chunk() {
        let mut bytes = encode(b"first").unwrap();
        let consumed_expected = bytes.len();
        bytes.extend_from_slice(&[0xFF; 16]);

        match decode(&bytes) {
            Decoded::Chunk { payload, consumed } => {
                assert_eq!(payload, b"first");
                assert_eq!(consumed, consumed_expected);
            }
            Decoded::End => panic!("expected chunk"),
        }
    }
}

//! Caller-supplied state adapter.

use crate::error::CoreResult;

/// Capability interface a data structure implements to become durable.
///
/// The core never inspects the structure's shape: it only moves opaque
/// serialized bytes between the adapter and the log. Any structure that
/// can serialize its full state and apply serialized mutations can be
/// made durable.
///
/// Serialization of individual mutations stays on the caller's side -
/// [`crate::Transaction::stage`] takes already-encoded bytes, and the
/// same bytes come back through [`DurableState::apply`] at commit time
/// and during recovery replay.
///
/// # Contract
///
/// - `deserialize(serialize(s))` must reproduce `s` for any reachable
///   state `s`.
/// - `apply` must be deterministic: replaying the same mutations in the
///   same order from the same starting state must yield the same result,
///   or recovery cannot reproduce the pre-crash state.
///
/// # Example
///
/// ```rust
/// use duralog_core::{CoreError, CoreResult, DurableState};
///
/// #[derive(Default, PartialEq, Debug)]
/// struct Counter(i64);
///
/// impl DurableState for Counter {
///     fn serialize(&self) -> CoreResult<Vec<u8>> {
///         Ok(self.0.to_le_bytes().to_vec())
///     }
///
///     fn deserialize(bytes: &[u8]) -> CoreResult<Self> {
///         let raw = bytes
///             .try_into()
///             .map_err(|_| CoreError::adapter("counter state must be 8 bytes"))?;
///         Ok(Counter(i64::from_le_bytes(raw)))
///     }
///
///     fn apply(&mut self, mutation: &[u8]) -> CoreResult<()> {
///         let raw = mutation
///             .try_into()
///             .map_err(|_| CoreError::adapter("counter mutation must be 8 bytes"))?;
///         self.0 += i64::from_le_bytes(raw);
///         Ok(())
///     }
/// }
/// ```
pub trait DurableState: Sized {
    /// Serializes the full current state for a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be serialized; the snapshot
    /// is not written and the log is left untouched.
    fn serialize(&self) -> CoreResult<Vec<u8>>;

    /// Reconstructs a state from snapshot bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes do not describe a valid state.
    /// During recovery this is treated as a corrupt snapshot and an
    /// earlier snapshot (or the initial state) is used instead.
    fn deserialize(bytes: &[u8]) -> CoreResult<Self>;

    /// Applies one serialized mutation to the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutation bytes cannot be interpreted.
    fn apply(&mut self, mutation: &[u8]) -> CoreResult<()>;
}

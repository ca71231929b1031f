//! Fault-injecting storage backend for crash and failure testing.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct FaultPlan {
    fail_next_append: AtomicBool,
    fail_next_sync: AtomicBool,
    // usize::MAX means "no partial append armed"
    partial_next_append: AtomicUsize,
    // Counts down per read_at call; fails when it hits 1. usize::MAX
    // means "no read failure armed".
    fail_read_countdown: AtomicUsize,
}

impl Default for FaultPlan {
    fn default() -> Self {
        Self {
            fail_next_append: AtomicBool::new(false),
            fail_next_sync: AtomicBool::new(false),
            partial_next_append: AtomicUsize::new(usize::MAX),
            fail_read_countdown: AtomicUsize::new(usize::MAX),
        }
    }
}

/// An in-memory backend that can be told to fail.
///
/// `FaultBackend` behaves like [`super::InMemoryBackend`] until a fault is
/// armed through its [`FaultControls`] handle. Faults fire once and disarm.
///
/// The controls handle also exposes the raw stored bytes, so a test can
/// hand the backend to a store, drive commits, then "crash" by rebuilding
/// a fresh backend from a captured (and possibly truncated or corrupted)
/// copy of the bytes.
///
/// # Example
///
/// ```rust
/// use duralog_storage::{FaultBackend, StorageBackend};
///
/// let mut backend = FaultBackend::new();
/// let controls = backend.controls();
///
/// controls.fail_next_sync();
/// backend.append(b"data").unwrap();
/// assert!(backend.sync().is_err());
/// assert!(backend.sync().is_ok()); // fault fired once
/// ```
#[derive(Debug, Default)]
pub struct FaultBackend {
    data: Arc<RwLock<Vec<u8>>>,
    plan: Arc<FaultPlan>,
}

/// Shared handle for arming faults and inspecting a [`FaultBackend`].
#[derive(Debug, Clone)]
pub struct FaultControls {
    data: Arc<RwLock<Vec<u8>>>,
    plan: Arc<FaultPlan>,
}

impl FaultBackend {
    /// Creates a new empty fault backend with no faults armed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fault backend seeded with pre-existing data.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            plan: Arc::new(FaultPlan::default()),
        }
    }

    /// Returns a controls handle that stays valid after the backend has
    /// been moved into a store.
    #[must_use]
    pub fn controls(&self) -> FaultControls {
        FaultControls {
            data: Arc::clone(&self.data),
            plan: Arc::clone(&self.plan),
        }
    }
}

impl FaultControls {
    /// Arms a one-shot append failure. No bytes land.
    pub fn fail_next_append(&self) {
        self.plan.fail_next_append.store(true, Ordering::SeqCst);
    }

    /// Arms a one-shot sync failure.
    pub fn fail_next_sync(&self) {
        self.plan.fail_next_sync.store(true, Ordering::SeqCst);
    }

    /// Arms a one-shot partial append: only the first `keep` bytes of the
    /// next append land before the call reports failure. Simulates a torn
    /// write at a chosen byte boundary.
    pub fn partial_next_append(&self, keep: usize) {
        self.plan.partial_next_append.store(keep, Ordering::SeqCst);
    }

    /// Arms a one-shot read failure on the `n`th `read_at` call from
    /// now (1-based). The stored bytes are untouched; only that one
    /// read reports an error. Simulates a transient medium read fault.
    pub fn fail_nth_read(&self, n: usize) {
        self.plan.fail_read_countdown.store(n, Ordering::SeqCst);
    }

    /// Returns a copy of all bytes currently stored.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for FaultBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let countdown = self.plan.fail_read_countdown.load(Ordering::SeqCst);
        if countdown != usize::MAX {
            if countdown <= 1 {
                self.plan
                    .fail_read_countdown
                    .store(usize::MAX, Ordering::SeqCst);
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected read failure",
                )));
            }
            self.plan
                .fail_read_countdown
                .store(countdown - 1, Ordering::SeqCst);
        }

        let data = self.data.read();
        let size = data.len() as u64;
        let offset_usize = offset as usize;
        let end = offset_usize.saturating_add(len);

        if offset > size || end > data.len() {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset_usize..end].to_vec())
    }

    fn append(&mut self, new_data: &[u8]) -> StorageResult<u64> {
        if self.plan.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(StorageError::PartialAppend {
                written: 0,
                requested: new_data.len(),
            });
        }

        let partial = self
            .plan
            .partial_next_append
            .swap(usize::MAX, Ordering::SeqCst);
        if partial != usize::MAX {
            let keep = partial.min(new_data.len());
            self.data.write().extend_from_slice(&new_data[..keep]);
            return Err(StorageError::PartialAppend {
                written: keep,
                requested: new_data.len(),
            });
        }

        let mut data = self.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        if self.plan.fail_next_sync.swap(false, Ordering::SeqCst) {
            return Err(StorageError::SyncFailed("injected sync failure".into()));
        }
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let current_size = data.len() as u64;

        if new_size > current_size {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "cannot truncate to size {} which is greater than current size {}",
                    new_size, current_size
                ),
            )));
        }

        data.truncate(new_size as usize);
        Ok(())
    }

    fn replace(&mut self, new_data: &[u8]) -> StorageResult<()> {
        *self.data.write() = new_data.to_vec();
        Ok(())
    }
}

//! Store tests over the real file backend.

use duralog_core::{Config, CoreError, CoreResult, DurableState, Store};
use duralog_storage::FileBackend;
use tempfile::TempDir;

#[derive(Debug, Default, PartialEq)]
struct Tape(Vec<u8>);

impl DurableState for Tape {
    fn serialize(&self) -> CoreResult<Vec<u8>> {
        Ok(self.0.clone())
    }

    fn deserialize(bytes: &[u8]) -> CoreResult<Self> {
        Ok(Self(bytes.to_vec()))
    }

    fn apply(&mut self, mutation: &[u8]) -> CoreResult<()> {
        self.0.extend_from_slice(mutation);
        Ok(())
    }
}

fn open(dir: &TempDir, config: Config) -> Store<Tape> {
    let path = dir.path().join("tape.duralog");
    let backend = FileBackend::open(&path).unwrap();
    Store::open(Box::new(backend), config, Tape::default()).unwrap()
}

#[test]
fn commits_survive_reopen_from_disk() {
    let dir = TempDir::new().unwrap();

    let store = open(&dir, Config::default());
    store.transaction(|txn| txn.stage(b"on disk".to_vec())).unwrap();
    drop(store);

    let reopened = open(&dir, Config::default());
    assert_eq!(reopened.read(|s| s.0.clone()), b"on disk");
}

#[test]
fn snapshot_compaction_shrinks_the_file_and_preserves_state() {
    let dir = TempDir::new().unwrap();
    let config = Config::default().auto_snapshot(false);

    let store = open(&dir, config.clone());
    for _ in 0..50 {
        store
            .transaction(|txn| txn.stage(vec![b'z'; 64]))
            .unwrap();
    }
    let before = store.log_size().unwrap();
    store.snapshot().unwrap();
    assert!(store.log_size().unwrap() < before);
    drop(store);

    let reopened = open(&dir, config);
    assert_eq!(reopened.read(|s| s.0.len()), 50 * 64);
}

#[test]
fn torn_tail_on_disk_is_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tape.duralog");
    let config = Config::default().auto_snapshot(false);

    {
        let backend = FileBackend::open(&path).unwrap();
        let store = Store::open(Box::new(backend), config.clone(), Tape::default()).unwrap();
        store.transaction(|txn| txn.stage(b"whole".to_vec())).unwrap();
        store.transaction(|txn| txn.stage(b"torn".to_vec())).unwrap();
    }

    // Chop a few bytes off the file, as a crash mid-write would.
    let len = std::fs::metadata(&path).unwrap().len();
    let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.set_len(len - 3).unwrap();
    drop(file);

    let backend = FileBackend::open(&path).unwrap();
    let store = Store::open(Box::new(backend), config, Tape::default()).unwrap();
    assert_eq!(store.read(|s| s.0.clone()), b"whole");
}

#[test]
fn adapter_error_aborts_via_transaction_closure() {
    let dir = TempDir::new().unwrap();
    let store = open(&dir, Config::default());

    let err = store
        .transaction(|txn| -> CoreResult<()> {
            txn.stage(b"rolled back".to_vec())?;
            Err(CoreError::adapter("caller-side validation"))
        })
        .unwrap_err();

    assert!(matches!(err, CoreError::Adapter { .. }));
    assert_eq!(store.read(|s| s.0.clone()), Vec::<u8>::new());
}

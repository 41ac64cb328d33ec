//! Durable claim-history storage.
//!
//! The limiter only needs get/put/remove by account with crash durability.
//! [`FileRecordStore`] keeps one JSON file per account and replaces it
//! atomically (write temp, fsync, rename), so a crash leaves either the old
//! or the new record, never a torn one.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use faucet_types::{Account, ClaimRecord, FaucetError, Result};
use parking_lot::Mutex;

/// Key-value storage for claim records.
pub trait RecordStore: Send + Sync {
    fn get(&self, account: &Account) -> Result<Option<ClaimRecord>>;

    fn put(&self, account: &Account, record: &ClaimRecord) -> Result<()>;

    /// Delete the record. Deleting a missing record is not an error.
    fn remove(&self, account: &Account) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for std::sync::Arc<S> {
    fn get(&self, account: &Account) -> Result<Option<ClaimRecord>> {
        (**self).get(account)
    }

    fn put(&self, account: &Account, record: &ClaimRecord) -> Result<()> {
        (**self).put(account, record)
    }

    fn remove(&self, account: &Account) -> Result<()> {
        (**self).remove(account)
    }
}

/// In-memory store. Loses everything on restart.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<Account, ClaimRecord>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accounts with a record.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, account: &Account) -> Result<Option<ClaimRecord>> {
        Ok(self.records.lock().get(account).cloned())
    }

    fn put(&self, account: &Account, record: &ClaimRecord) -> Result<()> {
        self.records.lock().insert(account.clone(), record.clone());
        Ok(())
    }

    fn remove(&self, account: &Account) -> Result<()> {
        self.records.lock().remove(account);
        Ok(())
    }
}

/// One `<account-hex>.json` file per account under `dir`.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    dir: PathBuf,
}

impl FileRecordStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| store_err("create", &dir, &e))?;
        tracing::debug!(dir = %dir.display(), "opened claim record store");
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, account: &Account) -> PathBuf {
        self.dir.join(format!("{}.json", account.to_hex()))
    }

    /// Best-effort directory fsync so the rename itself survives a crash.
    /// Some platforms cannot open or sync a directory; that is ignored.
    fn sync_dir(&self) {
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }
    }
}

impl RecordStore for FileRecordStore {
    fn get(&self, account: &Account) -> Result<Option<ClaimRecord>> {
        let path = self.path_for(account);
        match fs::read(&path) {
            Ok(bytes) => ClaimRecord::from_json_bytes(&bytes).map(Some).map_err(|e| {
                FaucetError::Store(format!("corrupt record {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_err("read", &path, &e)),
        }
    }

    fn put(&self, account: &Account, record: &ClaimRecord) -> Result<()> {
        let path = self.path_for(account);
        let tmp = path.with_extension("json.tmp");
        let bytes = record.to_json_bytes()?;

        let write = || -> io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &path)
        };
        write().map_err(|e| store_err("write", &path, &e))?;
        self.sync_dir();
        Ok(())
    }

    fn remove(&self, account: &Account) -> Result<()> {
        let path = self.path_for(account);
        match fs::remove_file(&path) {
            Ok(()) => {
                self.sync_dir();
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_err("remove", &path, &e)),
        }
    }
}

fn store_err(op: &str, path: &Path, err: &io::Error) -> FaucetError {
    FaucetError::Store(format!("{op} {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(secs: i64) -> ClaimRecord {
        ClaimRecord::first(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryRecordStore::new();
        let acct = Account::dummy(1);
        assert!(store.get(&acct).unwrap().is_none());

        store.put(&acct, &record(0)).unwrap();
        assert_eq!(store.get(&acct).unwrap(), Some(record(0)));
        assert_eq!(store.len(), 1);

        store.remove(&acct).unwrap();
        assert!(store.is_empty());
        store.remove(&acct).unwrap();
    }

    #[test]
    fn file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let acct = Account::dummy(7);
        {
            let store = FileRecordStore::open(dir.path()).unwrap();
            store.put(&acct, &record(5)).unwrap();
        }
        let store = FileRecordStore::open(dir.path()).unwrap();
        assert_eq!(store.get(&acct).unwrap(), Some(record(5)));
        assert!(dir.path().join(format!("{}.json", acct.to_hex())).exists());
        assert!(!dir.path().join(format!("{}.json.tmp", acct.to_hex())).exists());
    }

    #[test]
    fn file_store_overwrites_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::open(dir.path().join("nested/db")).unwrap();
        let acct = Account::dummy(9);

        store.put(&acct, &record(0)).unwrap();
        store.put(&acct, &record(40)).unwrap();
        assert_eq!(store.get(&acct).unwrap(), Some(record(40)));

        store.remove(&acct).unwrap();
        assert!(store.get(&acct).unwrap().is_none());
        store.remove(&acct).unwrap();
    }

    #[test]
    fn corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::open(dir.path()).unwrap();
        let acct = Account::dummy(3);
        fs::write(dir.path().join(format!("{}.json", acct.to_hex())), b"{oops").unwrap();

        let err = store.get(&acct).unwrap_err();
        assert!(matches!(err, FaucetError::Store(_)), "got {err:?}");
    }
}

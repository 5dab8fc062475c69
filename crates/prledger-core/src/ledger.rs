use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::LedgerError;
use crate::lock::LedgerLock;
use crate::model::{PrRecord, RecordId};
use crate::store::LedgerStore;

/// One read-modify-write cycle over the ledger file.
///
/// Opening takes the exclusive ledger lock and loads the document. Nothing
/// reaches the disk until [`LedgerFile::commit`]; dropping the value without
/// committing leaves the file exactly as it was.
#[derive(Debug)]
pub struct LedgerFile {
    path: PathBuf,
    store: LedgerStore,
    _lock: LedgerLock,
}

impl LedgerFile {
    /// Lock and load the ledger at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Lock`] if the lock cannot be taken within
    /// `lock_timeout`, or a store error if the document cannot be loaded.
    pub fn open(path: &Path, lock_timeout: Duration) -> Result<Self, LedgerError> {
        let lock = LedgerLock::acquire(&LedgerLock::path_for(path), lock_timeout)?;
        let store = LedgerStore::load(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            store,
            _lock: lock,
        })
    }

    #[must_use]
    pub const fn store(&self) -> &LedgerStore {
        &self.store
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert `record` under `id` and rewrite the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreWrite`] if the document cannot be written;
    /// the previous file is then left in place.
    pub fn commit(mut self, id: RecordId, record: PrRecord) -> Result<LedgerStore, LedgerError> {
        self.store.upsert(id, record);
        self.store.save(&self.path)?;
        Ok(self.store)
    }
}

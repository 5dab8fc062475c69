//! The JSON-backed record store.
//!
//! The ledger is one JSON object mapping `owner/repo#number` to a record.
//! Records keep the order in which they were loaded, and new records are
//! appended at the end, so rewriting the file produces minimal diffs and the
//! report lists pull requests in a reproducible order.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::LedgerError;
use crate::model::{PrRecord, RecordId};

/// Indentation used for the on-disk document.
const INDENT: &[u8] = b"    ";

/// In-memory view of the whole ledger document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStore {
    records: Vec<(RecordId, PrRecord)>,
}

impl LedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger at `path`. A missing file is an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreRead`] if the file exists but cannot be
    /// read, or [`LedgerError::StoreParse`] if it is not a valid ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "ledger missing, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(LedgerError::StoreRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let store: Self =
            serde_json::from_slice(&bytes).map_err(|source| LedgerError::StoreParse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::debug!(path = %path.display(), records = store.len(), "loaded ledger");
        Ok(store)
    }

    /// Parse a ledger document from text.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if the text is not a ledger.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize the whole ledger: 4-space indentation, trailing newline.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error if serialization fails.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the whole ledger to `path` via a sibling temp file and rename.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::StoreWrite`] if the document cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let write_err = |source: io::Error| LedgerError::StoreWrite {
            path: path.to_path_buf(),
            source,
        };

        let body = self
            .to_json_string()
            .map_err(|err| write_err(io::Error::new(io::ErrorKind::InvalidData, err)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        fs::write(&tmp_path, body).map_err(write_err)?;
        fs::rename(&tmp_path, path).map_err(write_err)?;

        tracing::debug!(path = %path.display(), records = self.len(), "persisted ledger");
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&PrRecord> {
        self.records
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, record)| record)
    }

    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Insert `record` under `id`, replacing in place if it already exists.
    ///
    /// Returns the previous record, if any.
    pub fn upsert(&mut self, id: RecordId, record: PrRecord) -> Option<PrRecord> {
        if let Some((_, slot)) = self.records.iter_mut().find(|(key, _)| *key == id) {
            return Some(std::mem::replace(slot, record));
        }
        self.records.push((id, record));
        None
    }

    /// Records in load order, followed by records created since.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &PrRecord)> {
        self.records.iter().map(|(id, record)| (id, record))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Serialize for LedgerStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (id, record) in &self.records {
            map.serialize_entry(id, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LedgerStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StoreVisitor;

        impl<'de> Visitor<'de> for StoreVisitor {
            type Value = LedgerStore;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping owner/repo#number to PR records")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut store = LedgerStore::new();
                while let Some((id, record)) = access.next_entry::<RecordId, PrRecord>()? {
                    if store.contains(&id) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate record id {id}"
                        )));
                    }
                    store.records.push((id, record));
                }
                Ok(store)
            }
        }

        deserializer.deserialize_map(StoreVisitor)
    }
}

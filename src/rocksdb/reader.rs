//! RocksDB snapshot backend
//!
//! Keys in `entries_by_path` are raw path bytes and RocksDB's default
//! comparator is byte-wise, so a forward iterator over that column family
//! already yields entries in merge order. A stream owns one iterator; dropping
//! the stream releases it.

use crate::entry::FsEntry;
use crate::error::{BackendError, BackendResult, RocksError, SourceError, SourceResult};
use crate::rocksdb::schema::{decode_path_key, meta_keys, RocksEntry, RocksHandle};
use crate::source::{require_path_ascending, Backend, Capabilities, EntryStream, SortSpec};
use rocksdb::{DBIteratorWithThreadMode, IteratorMode, DB};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only RocksDB snapshot
pub struct RocksBackend {
    handle: RocksHandle,
    db_path: PathBuf,
}

impl RocksBackend {
    /// Open an existing RocksDB snapshot read-only
    pub fn open<P: AsRef<Path>>(path: P) -> BackendResult<Self> {
        let db_path = path.as_ref();
        let handle = RocksHandle::open_readonly(db_path).map_err(|e| BackendError::OpenFailed {
            uri: format!("rocksdb:{}", db_path.display()),
            reason: e.to_string(),
        })?;

        debug!(path = %db_path.display(), "Opened RocksDB snapshot");

        Ok(Self {
            handle,
            db_path: db_path.to_path_buf(),
        })
    }

    /// Get the database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Entry count recorded by the writer, if any
    pub fn recorded_entries(&self) -> Option<u64> {
        self.handle
            .get_metadata(meta_keys::TOTAL_ENTRIES)
            .ok()
            .flatten()
            .and_then(|v| v.parse().ok())
    }
}

impl Backend for RocksBackend {
    fn name(&self) -> &'static str {
        "rocksdb"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FILTER
    }

    fn open_stream(&self, sort: &SortSpec) -> SourceResult<Box<dyn EntryStream + '_>> {
        require_path_ascending(sort)?;

        let cf = self.handle.cf_entries_by_path()?;
        let iter = self.handle.db.iterator_cf(cf, IteratorMode::Start);

        debug!(path = %self.db_path.display(), "Opened RocksDB entry stream");
        Ok(Box::new(RocksStream {
            iter,
            db_path: &self.db_path,
            served: 0,
        }))
    }
}

struct RocksStream<'a> {
    iter: DBIteratorWithThreadMode<'a, DB>,
    db_path: &'a Path,
    served: u64,
}

impl EntryStream for RocksStream<'_> {
    fn fetch_next(&mut self) -> SourceResult<Option<FsEntry>> {
        let (key, value) = match self.iter.next() {
            Some(item) => item.map_err(RocksError::from)?,
            None => return Ok(None),
        };

        let path = decode_path_key(&key).map_err(|e| SourceError::Decode {
            path: String::from_utf8_lossy(&key).into_owned(),
            reason: e.to_string(),
        })?;
        let record = RocksEntry::from_bytes(&value).map_err(|e| SourceError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if record.path != path {
            return Err(SourceError::Decode {
                reason: format!("record holds path '{}'", record.path),
                path,
            });
        }

        self.served += 1;
        Ok(Some(record.into_fs_entry()))
    }
}

impl Drop for RocksStream<'_> {
    fn drop(&mut self) {
        debug!(
            path = %self.db_path.display(),
            served = self.served,
            "Released RocksDB entry stream"
        );
    }
}

//! RocksDB snapshot writer
//!
//! Mirrors the SQLite writer: entries are written in batches, metadata is
//! recorded alongside, and `finish` flushes memtables to disk.

use crate::entry::FsEntry;
use crate::error::{RocksError, RocksResult};
use crate::rocksdb::schema::{encode_path_key, meta_keys, RocksEntry, RocksHandle};
use rocksdb::{WriteBatch, WriteOptions};
use std::path::Path;
use tracing::{debug, info};

/// Configuration for the RocksDB writer
pub struct RocksWriterConfig {
    /// Batch size before flushing
    pub batch_size: usize,
    /// Disable WAL for better write performance
    pub disable_wal: bool,
}

impl Default for RocksWriterConfig {
    fn default() -> Self {
        Self {
            batch_size: 10_000,
            disable_wal: true,
        }
    }
}

/// RocksDB snapshot writer
pub struct RocksWriter {
    handle: RocksHandle,
    config: RocksWriterConfig,
    pending: Vec<FsEntry>,
    written: u64,
}

impl RocksWriter {
    /// Create a new RocksDB snapshot; fails if the path already exists
    pub fn create<P: AsRef<Path>>(path: P, config: RocksWriterConfig) -> RocksResult<Self> {
        let path_ref = path.as_ref();
        if path_ref.exists() {
            return Err(RocksError::Io(format!(
                "'{}' already exists",
                path_ref.display()
            )));
        }

        let handle = RocksHandle::open(path_ref)?;
        handle.set_metadata(meta_keys::WRITER_VERSION, env!("CARGO_PKG_VERSION"))?;
        handle.set_metadata(meta_keys::START_TIME, &chrono::Utc::now().to_rfc3339())?;
        handle.set_metadata(meta_keys::STATUS, "running")?;

        Ok(Self {
            handle,
            pending: Vec::with_capacity(config.batch_size.max(1)),
            config,
            written: 0,
        })
    }

    /// Get reference to the underlying handle
    pub fn handle(&self) -> &RocksHandle {
        &self.handle
    }

    /// Set snapshot metadata
    pub fn set_metadata(&self, key: &str, value: &str) -> RocksResult<()> {
        self.handle.set_metadata(key, value)
    }

    /// Queue an entry, writing a batch when full
    pub fn add(&mut self, entry: FsEntry) -> RocksResult<()> {
        self.pending.push(entry);
        if self.pending.len() >= self.config.batch_size.max(1) {
            let batch = std::mem::take(&mut self.pending);
            self.write_batch(&batch)?;
        }
        Ok(())
    }

    /// Write a batch of entries
    pub fn write_batch(&mut self, entries: &[FsEntry]) -> RocksResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::default();
        let cf_path = self.handle.cf_entries_by_path()?;

        for entry in entries {
            let value = RocksEntry::from_fs_entry(entry)
                .to_bytes()
                .map_err(|e| RocksError::Bincode(e.to_string()))?;
            batch.put_cf(cf_path, encode_path_key(&entry.path), value);
        }

        let mut write_opts = WriteOptions::default();
        if self.config.disable_wal {
            write_opts.disable_wal(true);
        }

        self.handle.db.write_opt(batch, &write_opts)?;
        self.written += entries.len() as u64;
        debug!(entries = entries.len(), total = self.written, "RocksDB batch written");
        Ok(())
    }

    /// Write pending entries, record totals and flush memtables to disk
    pub fn finish(mut self) -> RocksResult<u64> {
        let batch = std::mem::take(&mut self.pending);
        self.write_batch(&batch)?;

        self.handle
            .set_metadata(meta_keys::TOTAL_ENTRIES, &self.written.to_string())?;
        self.handle
            .set_metadata(meta_keys::END_TIME, &chrono::Utc::now().to_rfc3339())?;
        self.handle.set_metadata(meta_keys::STATUS, "completed")?;
        self.handle.db.flush()?;

        info!(entries = self.written, "RocksDB snapshot finalized");
        Ok(self.written)
    }
}

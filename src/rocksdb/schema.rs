//! RocksDB schema definitions
//!
//! Defines the column families, key encoding, and RocksEntry struct
//! for storing filesystem entries in RocksDB.

use crate::entry::{FsEntry, XattrValue};
use crate::error::{RocksError, RocksResult};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Column family names
pub const CF_ENTRIES_BY_PATH: &str = "entries_by_path";
pub const CF_METADATA: &str = "metadata";

/// Metadata keys
pub mod meta_keys {
    pub const SOURCE: &str = "source";
    pub const START_TIME: &str = "start_time";
    pub const END_TIME: &str = "end_time";
    pub const STATUS: &str = "status";
    pub const TOTAL_ENTRIES: &str = "total_entries";
    pub const WRITER_VERSION: &str = "writer_version";
}

/// Entry stored in RocksDB with bincode serialization
///
/// The path is the key; it is repeated in the value so a record decodes on
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksEntry {
    pub path: String,
    pub mode: u32,
    pub xattrs: BTreeMap<String, XattrValue>,
}

impl RocksEntry {
    /// Convert from FsEntry
    pub fn from_fs_entry(entry: &FsEntry) -> Self {
        Self {
            path: entry.path.clone(),
            mode: entry.mode,
            xattrs: entry.xattrs.clone(),
        }
    }

    /// Convert to FsEntry
    pub fn into_fs_entry(self) -> FsEntry {
        FsEntry {
            path: self.path,
            mode: self.mode,
            xattrs: self.xattrs,
        }
    }

    /// Serialize to bytes using bincode
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Encode path as key (UTF-8 bytes, so key order is byte-wise path order)
pub fn encode_path_key(path: &str) -> Vec<u8> {
    path.as_bytes().to_vec()
}

/// Decode path from key
pub fn decode_path_key(key: &[u8]) -> Result<String, std::string::FromUtf8Error> {
    String::from_utf8(key.to_vec())
}

/// Get column family options for entries
fn entries_cf_options() -> Options {
    let mut opts = Options::default();

    opts.set_write_buffer_size(32 * 1024 * 1024);
    opts.set_max_write_buffer_number(2);

    // Entries are read back as one forward scan; no bloom filter needed
    opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

    opts
}

/// Get column family options for metadata (small, infrequent writes)
fn metadata_cf_options() -> Options {
    let mut opts = Options::default();
    opts.set_write_buffer_size(4 * 1024 * 1024);
    opts.set_max_write_buffer_number(2);
    opts
}

fn db_options() -> Options {
    let mut opts = Options::default();
    opts.create_if_missing(true);
    opts.create_missing_column_families(true);
    opts.set_max_background_jobs(4);
    opts
}

/// Open or create a RocksDB snapshot with all column families
pub fn open_rocks_db<P: AsRef<Path>>(path: P) -> Result<DB, rocksdb::Error> {
    let cf_descriptors = vec![
        ColumnFamilyDescriptor::new(CF_ENTRIES_BY_PATH, entries_cf_options()),
        ColumnFamilyDescriptor::new(CF_METADATA, metadata_cf_options()),
    ];

    DB::open_cf_descriptors(&db_options(), path, cf_descriptors)
}

/// Open existing RocksDB snapshot for reading
pub fn open_rocks_db_readonly<P: AsRef<Path>>(path: P) -> Result<DB, rocksdb::Error> {
    DB::open_cf_for_read_only(
        &db_options(),
        path,
        [CF_ENTRIES_BY_PATH, CF_METADATA],
        false,
    )
}

/// RocksDB handle wrapper with column family accessors
pub struct RocksHandle {
    pub db: DB,
}

impl RocksHandle {
    /// Open or create database
    pub fn open<P: AsRef<Path>>(path: P) -> RocksResult<Self> {
        let db = open_rocks_db(path)?;
        Ok(Self { db })
    }

    /// Open for read-only access
    pub fn open_readonly<P: AsRef<Path>>(path: P) -> RocksResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RocksError::NotFound(path.display().to_string()));
        }
        let db = open_rocks_db_readonly(path)?;
        Ok(Self { db })
    }

    /// Get entries_by_path column family
    pub fn cf_entries_by_path(&self) -> RocksResult<&ColumnFamily> {
        self.db
            .cf_handle(CF_ENTRIES_BY_PATH)
            .ok_or_else(|| RocksError::NotFound(format!("column family {}", CF_ENTRIES_BY_PATH)))
    }

    /// Get metadata column family
    pub fn cf_metadata(&self) -> RocksResult<&ColumnFamily> {
        self.db
            .cf_handle(CF_METADATA)
            .ok_or_else(|| RocksError::NotFound(format!("column family {}", CF_METADATA)))
    }

    /// Set metadata value
    pub fn set_metadata(&self, key: &str, value: &str) -> RocksResult<()> {
        self.db
            .put_cf(self.cf_metadata()?, key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    /// Get metadata value
    pub fn get_metadata(&self, key: &str) -> RocksResult<Option<String>> {
        match self.db.get_cf(self.cf_metadata()?, key.as_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).to_string())),
            None => Ok(None),
        }
    }

    /// Get entry by path
    pub fn get_by_path(&self, path: &str) -> RocksResult<Option<FsEntry>> {
        let key = encode_path_key(path);
        match self.db.get_cf(self.cf_entries_by_path()?, &key)? {
            Some(bytes) => {
                let entry = RocksEntry::from_bytes(&bytes)
                    .map_err(|e| RocksError::Bincode(e.to_string()))?;
                Ok(Some(entry.into_fs_entry()))
            }
            None => Ok(None),
        }
    }
}

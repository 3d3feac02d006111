//! Error types for snapdiff
//!
//! This module defines the error hierarchy used across the crate:
//! - Entry stream errors (open, fetch, decode)
//! - Backend lifecycle errors (URI parsing, open, capability checks)
//! - Snapshot store errors (SQLite, RocksDB)
//! - Configuration errors
//!
//! Divergences found while diffing are not errors: they are reported as
//! [`crate::report::Divergence`] values and the diff keeps going.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for a diff run
#[derive(Error, Debug)]
pub enum DiffError {
    /// Backend could not be opened or does not qualify
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// A stream failed while the diff was running
    #[error("Failed to read entries from '{uri}': {source}")]
    Source {
        uri: String,
        #[source]
        source: SourceError,
    },

    /// The number of URIs does not match the number of backends
    #[error("Got {uris} URIs for {backends} backends")]
    Arity { uris: usize, backends: usize },

    /// Writing a report line failed
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DiffError {
    /// Wrap a stream error with the URI of the backend it came from
    pub fn read_failed(uri: impl Into<String>, source: SourceError) -> Self {
        DiffError::Source {
            uri: uri.into(),
            source,
        }
    }
}

/// Errors raised by an entry stream
#[derive(Error, Debug)]
pub enum SourceError {
    /// The backend cannot produce entries in the requested order
    #[error("Unsupported sort: {0}")]
    UnsupportedSort(String),

    /// Opening the stream failed
    #[error("Failed to open entry stream: {0}")]
    Open(String),

    /// Fetching the next entry failed
    #[error("Failed to fetch next entry: {0}")]
    Fetch(String),

    /// A stored record could not be decoded into an entry
    #[error("Corrupt entry '{path}': {reason}")]
    Decode { path: String, reason: String },

    /// SQLite errors
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// RocksDB errors
    #[cfg(feature = "rocksdb")]
    #[error("RocksDB error: {0}")]
    Rocks(#[from] RocksError),
}

/// Backend lifecycle errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Failed to parse a backend URI
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// No backend is registered for this scheme
    #[error("Unknown backend '{scheme}' in '{uri}'")]
    UnknownScheme { uri: String, scheme: String },

    /// Opening the backend failed
    #[error("Failed to open backend '{uri}': {reason}")]
    OpenFailed { uri: String, reason: String },

    /// Backend cannot filter/sort its entries
    #[error("uri '{uri}' does not support filtering")]
    NoFilterSupport { uri: String },
}

/// SQLite snapshot errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to create database file
    #[error("Failed to create database at '{path}': {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Snapshot does not carry the expected tables
    #[error("Database schema error: {0}")]
    Schema(String),
}

/// RocksDB snapshot errors
#[cfg(feature = "rocksdb")]
#[derive(Error, Debug)]
pub enum RocksError {
    /// RocksDB operation failed
    #[error("RocksDB error: {0}")]
    Rocks(#[from] rocksdb::Error),

    /// Bincode serialization/deserialization error
    #[error("Serialization error: {0}")]
    Bincode(String),

    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(String),

    /// Database not found
    #[error("Database not found: {0}")]
    NotFound(String),
}

/// Result type alias for RocksError
#[cfg(feature = "rocksdb")]
pub type RocksResult<T> = std::result::Result<T, RocksError>;

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Fewer than two URIs were given
    #[error("not enough arguments, at least 2 URI must be provided.")]
    NotEnoughUris { count: usize },

    /// A URI could not be parsed
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Invalid page size
    #[error("Invalid page size {size}: must be between {min} and {max}")]
    InvalidPageSize { size: usize, min: usize, max: usize },

    /// Invalid checksum attribute name
    #[error("Invalid checksum xattr name '{name}': {reason}")]
    InvalidXattrName { name: String, reason: String },
}

/// Result type alias for DiffError
pub type Result<T> = std::result::Result<T, DiffError>;

/// Result type alias for SourceError
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for BackendError
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Result type alias for DbError
pub type DbResult<T> = std::result::Result<T, DbError>;

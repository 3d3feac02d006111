//! Snapshot database schema definitions and creation
//!
//! A SQLite snapshot holds one row per filesystem entry plus one row per
//! extended attribute. Paths are unique and compared with SQLite's default
//! BINARY collation, which orders them byte-wise, the same order the merge
//! engine uses.

use crate::entry::XattrValue;
use crate::error::{DbError, DbResult};
use rusqlite::types::{Value, ValueRef};
use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: u32 = 1;

/// SQL to create the main entries table
const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY,
    path TEXT NOT NULL UNIQUE,
    entry_type INTEGER NOT NULL,  -- 0=file, 1=dir, 2=symlink, 3+=other
    mode INTEGER NOT NULL         -- st_mode: type + permission bits
)
"#;

/// SQL to create the extended attributes table
const CREATE_XATTRS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS xattrs (
    entry_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    kind TEXT NOT NULL,           -- string, binary, int64, ...
    value,                        -- TEXT, BLOB or INTEGER depending on kind
    PRIMARY KEY (entry_id, name),
    FOREIGN KEY (entry_id) REFERENCES entries(id)
)
"#;

/// SQL to create snapshot metadata table
const CREATE_SNAPSHOT_INFO_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot_info (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// SQL to create indexes for common queries
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_entries_type ON entries(entry_type)",
    "CREATE INDEX IF NOT EXISTS idx_xattrs_name ON xattrs(name)",
];

/// SQLite pragmas for bulk snapshot writes
const WRITE_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = OFF;
PRAGMA cache_size = -64000;      -- 64MB cache
PRAGMA temp_store = MEMORY;
"#;

/// SQLite pragmas applied once the snapshot is complete
const READ_PRAGMAS: &str = r#"
PRAGMA journal_mode = DELETE;    -- plain file, openable read-only
PRAGMA synchronous = FULL;
"#;

/// Create and configure a new snapshot database for writing
pub fn create_database(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(WRITE_PRAGMAS)?;

    conn.execute(CREATE_ENTRIES_TABLE, [])?;
    conn.execute(CREATE_XATTRS_TABLE, [])?;
    conn.execute(CREATE_SNAPSHOT_INFO_TABLE, [])?;

    Ok(())
}

/// Create secondary indexes (after bulk inserts)
pub fn create_indexes(conn: &Connection) -> DbResult<()> {
    for sql in CREATE_INDEXES {
        conn.execute(sql, [])?;
    }
    Ok(())
}

/// Apply read-optimized settings
pub fn optimize_for_reads(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(READ_PRAGMAS)?;
    conn.execute("ANALYZE", [])?;
    Ok(())
}

/// Fail unless the connection holds a snapshot database
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    for table in ["entries", "xattrs"] {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        if count == 0 {
            return Err(DbError::Schema(format!("missing table '{}'", table)));
        }
    }
    Ok(())
}

/// Store snapshot metadata
pub fn set_snapshot_info(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO snapshot_info (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Get snapshot metadata
pub fn get_snapshot_info(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM snapshot_info WHERE key = ?1",
        [key],
        |row| row.get(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Encode an attribute value into its `(kind, value)` column pair
///
/// Unsigned 64-bit values are stored bit-cast into SQLite's signed INTEGER.
pub fn encode_xattr(value: &XattrValue) -> (&'static str, Value) {
    let column = match value {
        XattrValue::Boolean(b) => Value::Integer(i64::from(*b)),
        XattrValue::Int32(v) => Value::Integer(i64::from(*v)),
        XattrValue::UInt32(v) => Value::Integer(i64::from(*v)),
        XattrValue::Int64(v) => Value::Integer(*v),
        XattrValue::UInt64(v) => Value::Integer(*v as i64),
        XattrValue::String(s) => Value::Text(s.clone()),
        XattrValue::Binary(b) => Value::Blob(b.clone()),
        XattrValue::Sequence(items) => {
            Value::Text(serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string()))
        }
    };
    (value.kind(), column)
}

/// Decode a `(kind, value)` column pair back into an attribute value
pub fn decode_xattr(kind: &str, value: ValueRef<'_>) -> Result<XattrValue, String> {
    let integer = || value.as_i64().map_err(|e| e.to_string());
    let decoded = match kind {
        "boolean" => XattrValue::Boolean(integer()? != 0),
        "int32" => XattrValue::Int32(integer()? as i32),
        "uint32" => XattrValue::UInt32(integer()? as u32),
        "int64" => XattrValue::Int64(integer()?),
        "uint64" => XattrValue::UInt64(integer()? as u64),
        "string" => XattrValue::String(
            value
                .as_str()
                .map_err(|e| e.to_string())?
                .to_string(),
        ),
        "binary" => XattrValue::Binary(value.as_blob().map_err(|e| e.to_string())?.to_vec()),
        "sequence" => {
            let text = value.as_str().map_err(|e| e.to_string())?;
            XattrValue::Sequence(serde_json::from_str(text).map_err(|e| e.to_string())?)
        }
        other => return Err(format!("unknown xattr kind '{}'", other)),
    };
    Ok(decoded)
}

/// Metadata keys recorded in `snapshot_info`
pub mod keys {
    /// Schema version
    pub const SCHEMA_VERSION: &str = "schema_version";

    /// Version of the tool that wrote the snapshot
    pub const WRITER_VERSION: &str = "writer_version";

    /// Where the snapshot was taken from
    pub const SOURCE: &str = "source";

    /// Timestamp when the snapshot was started (RFC 3339)
    pub const START_TIME: &str = "start_time";

    /// Timestamp when the snapshot was completed (RFC 3339)
    pub const END_TIME: &str = "end_time";

    /// Total entries recorded
    pub const TOTAL_ENTRIES: &str = "total_entries";

    /// Snapshot status: "running", "completed"
    pub const STATUS: &str = "status";
}

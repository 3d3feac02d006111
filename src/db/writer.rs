//! Batched SQLite snapshot writer
//!
//! Buffers entries and inserts them in batches, one transaction per batch,
//! with cached prepared statements. Indexes and read-optimized pragmas are
//! applied once when the snapshot is finished.

use crate::db::schema::{self, keys};
use crate::entry::FsEntry;
use crate::error::{DbError, DbResult};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default number of entries per insert transaction
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Statistics about write operations
#[derive(Debug, Default, Clone, Copy)]
pub struct WriterStats {
    /// Total entries written
    pub entries_written: u64,

    /// Total extended attributes written
    pub xattrs_written: u64,

    /// Total batches committed
    pub batches_committed: u64,
}

/// Writer producing a SQLite snapshot database
pub struct SnapshotWriter {
    conn: Connection,
    buffer: Vec<FsEntry>,
    batch_size: usize,
    stats: WriterStats,
    db_path: PathBuf,
}

impl SnapshotWriter {
    /// Create a new snapshot database at `db_path`
    ///
    /// Fails if a file already exists there.
    pub fn create(db_path: &Path, batch_size: usize) -> DbResult<Self> {
        if db_path.exists() {
            return Err(DbError::CreateFailed {
                path: db_path.to_path_buf(),
                reason: "file already exists".to_string(),
            });
        }

        let conn = Connection::open(db_path)?;
        schema::create_database(&conn)?;

        schema::set_snapshot_info(&conn, keys::SCHEMA_VERSION, &schema::SCHEMA_VERSION.to_string())?;
        schema::set_snapshot_info(&conn, keys::WRITER_VERSION, env!("CARGO_PKG_VERSION"))?;
        schema::set_snapshot_info(&conn, keys::START_TIME, &chrono::Utc::now().to_rfc3339())?;
        schema::set_snapshot_info(&conn, keys::STATUS, "running")?;

        Ok(Self {
            conn,
            buffer: Vec::with_capacity(batch_size.max(1)),
            batch_size: batch_size.max(1),
            stats: WriterStats::default(),
            db_path: db_path.to_path_buf(),
        })
    }

    /// Record where the snapshot was taken from
    pub fn set_source(&self, source: &str) -> DbResult<()> {
        schema::set_snapshot_info(&self.conn, keys::SOURCE, source)
    }

    /// Queue an entry, flushing when the batch is full
    pub fn add(&mut self, entry: FsEntry) -> DbResult<()> {
        self.buffer.push(entry);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Queue several entries
    pub fn add_all<I: IntoIterator<Item = FsEntry>>(&mut self, entries: I) -> DbResult<()> {
        for entry in entries {
            self.add(entry)?;
        }
        Ok(())
    }

    /// Write all buffered entries
    pub fn flush(&mut self) -> DbResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        flush_entries(&self.conn, &mut self.buffer, &mut self.stats)?;
        debug!(
            entries = self.stats.entries_written,
            batches = self.stats.batches_committed,
            "Snapshot batch committed"
        );
        Ok(())
    }

    /// Get writer statistics
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Get the database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Flush, index and mark the snapshot completed
    pub fn finish(mut self) -> DbResult<WriterStats> {
        self.flush()?;

        schema::create_indexes(&self.conn)?;
        schema::set_snapshot_info(
            &self.conn,
            keys::TOTAL_ENTRIES,
            &self.stats.entries_written.to_string(),
        )?;
        schema::set_snapshot_info(&self.conn, keys::END_TIME, &chrono::Utc::now().to_rfc3339())?;
        schema::set_snapshot_info(&self.conn, keys::STATUS, "completed")?;
        schema::optimize_for_reads(&self.conn)?;

        Ok(self.stats)
    }
}

/// Flush entry buffer to database
fn flush_entries(
    conn: &Connection,
    buffer: &mut Vec<FsEntry>,
    stats: &mut WriterStats,
) -> DbResult<()> {
    let tx = conn.unchecked_transaction()?;

    {
        let mut entry_stmt = tx.prepare_cached(
            "INSERT INTO entries (path, entry_type, mode) VALUES (?1, ?2, ?3)",
        )?;
        let mut xattr_stmt = tx.prepare_cached(
            "INSERT INTO xattrs (entry_id, name, kind, value) VALUES (?1, ?2, ?3, ?4)",
        )?;

        for entry in buffer.drain(..) {
            entry_stmt.execute(params![
                entry.path,
                entry.entry_type().as_db_int(),
                i64::from(entry.mode),
            ])?;
            let entry_id = tx.last_insert_rowid();

            for (name, value) in &entry.xattrs {
                let (kind, column) = schema::encode_xattr(value);
                xattr_stmt.execute(params![entry_id, name, kind, column])?;
                stats.xattrs_written += 1;
            }

            stats.entries_written += 1;
        }
    }

    tx.commit()?;
    stats.batches_committed += 1;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::XattrValue;
    use tempfile::tempdir;

    #[test]
    fn test_writer_basic() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("snap.db");

        let mut writer = SnapshotWriter::create(&db_path, 4).unwrap();
        for i in 0..10 {
            writer
                .add(
                    FsEntry::new(format!("/test/file{}.txt", i), 0o100644)
                        .with_xattr("user.hash", XattrValue::String(format!("h{}", i))),
                )
                .unwrap();
        }
        let stats = writer.finish().unwrap();

        assert_eq!(stats.entries_written, 10);
        assert_eq!(stats.xattrs_written, 10);
        assert_eq!(stats.batches_committed, 3);

        let conn = Connection::open(&db_path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 10);
        assert_eq!(
            schema::get_snapshot_info(&conn, keys::STATUS).unwrap(),
            Some("completed".to_string())
        );
        assert_eq!(
            schema::get_snapshot_info(&conn, keys::TOTAL_ENTRIES).unwrap(),
            Some("10".to_string())
        );
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("snap.db");

        let mut writer = SnapshotWriter::create(&db_path, 100).unwrap();
        writer.add(FsEntry::new("/a", 0o100644)).unwrap();
        writer.add(FsEntry::new("/a", 0o100600)).unwrap();
        assert!(matches!(writer.flush(), Err(DbError::Sqlite(_))));
    }

    #[test]
    fn test_refuses_existing_file() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("snap.db");
        std::fs::write(&db_path, b"").unwrap();

        assert!(matches!(
            SnapshotWriter::create(&db_path, 100),
            Err(DbError::CreateFailed { .. })
        ));
    }
}

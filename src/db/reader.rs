//! SQLite snapshot backend
//!
//! Streams entries in path order using keyset pagination: each page is one
//! `ORDER BY path LIMIT n` query resuming after the last path served, so a
//! stream never holds more than one page and never keeps a statement open
//! across fetches.

use crate::db::schema;
use crate::entry::FsEntry;
use crate::error::{BackendError, BackendResult, SourceError, SourceResult};
use crate::source::{require_path_ascending, Backend, Capabilities, EntryStream, SortSpec};
use rusqlite::{params, Connection, OpenFlags};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default number of entries fetched per page
pub const DEFAULT_PAGE_SIZE: usize = 1_000;

const FIRST_PAGE: &str = "SELECT id, path, mode FROM entries ORDER BY path LIMIT ?1";

const NEXT_PAGE: &str =
    "SELECT id, path, mode FROM entries WHERE path > ?1 ORDER BY path LIMIT ?2";

const ENTRY_XATTRS: &str = "SELECT name, kind, value FROM xattrs WHERE entry_id = ?1";

/// Read-only SQLite snapshot
pub struct SqliteBackend {
    conn: Connection,
    db_path: PathBuf,
    page_size: usize,
}

impl SqliteBackend {
    /// Open an existing snapshot database read-only
    pub fn open(db_path: &Path, page_size: usize) -> BackendResult<Self> {
        let open_failed = |reason: String| BackendError::OpenFailed {
            uri: format!("sqlite:{}", db_path.display()),
            reason,
        };

        if !db_path.exists() {
            return Err(open_failed("no such file".to_string()));
        }

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| open_failed(e.to_string()))?;
        schema::verify_schema(&conn).map_err(|e| open_failed(e.to_string()))?;

        debug!(path = %db_path.display(), page_size, "Opened SQLite snapshot");

        Ok(Self {
            conn,
            db_path: db_path.to_path_buf(),
            page_size: page_size.max(1),
        })
    }

    /// Get the database path
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Number of entries in the snapshot
    pub fn entry_count(&self) -> SourceResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::FILTER
    }

    fn open_stream(&self, sort: &SortSpec) -> SourceResult<Box<dyn EntryStream + '_>> {
        require_path_ascending(sort)?;

        // Surface a broken database at open time rather than on first fetch
        self.conn.prepare_cached(FIRST_PAGE)?;

        debug!(path = %self.db_path.display(), "Opened SQLite entry stream");
        Ok(Box::new(SqliteStream {
            conn: &self.conn,
            db_path: &self.db_path,
            page: VecDeque::with_capacity(self.page_size),
            page_size: self.page_size,
            last_path: None,
            exhausted: false,
            served: 0,
        }))
    }
}

struct SqliteStream<'a> {
    conn: &'a Connection,
    db_path: &'a Path,
    page: VecDeque<FsEntry>,
    page_size: usize,
    last_path: Option<String>,
    exhausted: bool,
    served: u64,
}

impl SqliteStream<'_> {
    fn load_page(&mut self) -> SourceResult<()> {
        let limit = self.page_size as i64;
        let rows: Vec<(i64, String, i64)> = match &self.last_path {
            None => {
                let mut stmt = self.conn.prepare_cached(FIRST_PAGE)?;
                let rows = stmt.query_map(params![limit], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?;
                rows.collect::<Result<_, _>>()?
            }
            Some(last) => {
                let mut stmt = self.conn.prepare_cached(NEXT_PAGE)?;
                let rows = stmt.query_map(params![last, limit], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })?;
                rows.collect::<Result<_, _>>()?
            }
        };

        if rows.len() < self.page_size {
            self.exhausted = true;
        }

        let mut xattr_stmt = self.conn.prepare_cached(ENTRY_XATTRS)?;
        for (id, path, mode) in rows {
            let mode = u32::try_from(mode).map_err(|_| SourceError::Decode {
                path: path.clone(),
                reason: format!("mode {} out of range", mode),
            })?;
            let mut entry = FsEntry::new(path, mode);

            let mut xattr_rows = xattr_stmt.query(params![id])?;
            while let Some(row) = xattr_rows.next()? {
                let name: String = row.get(0)?;
                let kind: String = row.get(1)?;
                let value = schema::decode_xattr(&kind, row.get_ref(2)?).map_err(|reason| {
                    SourceError::Decode {
                        path: entry.path.clone(),
                        reason: format!("xattr '{}': {}", name, reason),
                    }
                })?;
                entry.xattrs.insert(name, value);
            }

            self.last_path = Some(entry.path.clone());
            self.page.push_back(entry);
        }

        Ok(())
    }
}

impl EntryStream for SqliteStream<'_> {
    fn fetch_next(&mut self) -> SourceResult<Option<FsEntry>> {
        if self.page.is_empty() && !self.exhausted {
            self.load_page()?;
        }

        let entry = self.page.pop_front();
        if entry.is_some() {
            self.served += 1;
        }
        Ok(entry)
    }
}

impl Drop for SqliteStream<'_> {
    fn drop(&mut self) {
        debug!(
            path = %self.db_path.display(),
            served = self.served,
            "Released SQLite entry stream"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::writer::SnapshotWriter;
    use crate::entry::XattrValue;
    use tempfile::tempdir;

    fn create_test_snapshot(dir: &Path, entries: Vec<FsEntry>) -> PathBuf {
        let db_path = dir.join("snap.db");
        let mut writer = SnapshotWriter::create(&db_path, 100).unwrap();
        writer.add_all(entries).unwrap();
        writer.finish().unwrap();
        db_path
    }

    fn drain(stream: &mut dyn EntryStream) -> Vec<FsEntry> {
        let mut entries = Vec::new();
        while let Some(entry) = stream.fetch_next().unwrap() {
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn test_stream_is_path_ordered_across_pages() {
        let dir = tempdir().unwrap();
        let db_path = create_test_snapshot(
            dir.path(),
            vec![
                FsEntry::new("/c", 0o100644),
                FsEntry::new("/a", 0o040755),
                FsEntry::new("/a/b", 0o100644),
                FsEntry::new("/B", 0o100644),
                FsEntry::new("/a-b", 0o100644),
            ],
        );

        // Page size 2 forces several keyset pages
        let backend = SqliteBackend::open(&db_path, 2).unwrap();
        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        let paths: Vec<String> = drain(stream.as_mut()).into_iter().map(|e| e.path).collect();

        // Byte order: '-' (0x2d) < '/' (0x2f), 'B' < 'a'
        assert_eq!(paths, vec!["/B", "/a", "/a-b", "/a/b", "/c"]);
    }

    #[test]
    fn test_stream_carries_mode_and_xattrs() {
        let dir = tempdir().unwrap();
        let db_path = create_test_snapshot(
            dir.path(),
            vec![FsEntry::new("/f", 0o100755)
                .with_xattr("user.hash", XattrValue::Binary(vec![0xde, 0xad]))
                .with_xattr("user.tag", XattrValue::UInt32(3))],
        );

        let backend = SqliteBackend::open(&db_path, DEFAULT_PAGE_SIZE).unwrap();
        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        let entries = drain(stream.as_mut());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].mode, 0o100755);
        assert_eq!(
            entries[0].xattr("user.hash"),
            Some(&XattrValue::Binary(vec![0xde, 0xad]))
        );
        assert_eq!(entries[0].xattr("user.tag"), Some(&XattrValue::UInt32(3)));
    }

    #[test]
    fn test_empty_snapshot() {
        let dir = tempdir().unwrap();
        let db_path = create_test_snapshot(dir.path(), vec![]);

        let backend = SqliteBackend::open(&db_path, 10).unwrap();
        assert_eq!(backend.entry_count().unwrap(), 0);
        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert!(stream.fetch_next().unwrap().is_none());
        assert!(stream.fetch_next().unwrap().is_none());
    }

    #[test]
    fn test_exact_page_multiple() {
        let dir = tempdir().unwrap();
        let entries = (0..4).map(|i| FsEntry::new(format!("/f{}", i), 0o100644)).collect();
        let db_path = create_test_snapshot(dir.path(), entries);

        let backend = SqliteBackend::open(&db_path, 2).unwrap();
        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert_eq!(drain(stream.as_mut()).len(), 4);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let result = SqliteBackend::open(&dir.path().join("absent.db"), 10);
        assert!(matches!(result, Err(BackendError::OpenFailed { .. })));
    }

    #[test]
    fn test_open_foreign_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("other.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE unrelated (x INTEGER)", []).unwrap();
        drop(conn);

        let result = SqliteBackend::open(&db_path, 10);
        assert!(matches!(result, Err(BackendError::OpenFailed { .. })));
    }

    #[test]
    fn test_corrupt_mode_is_decode_error() {
        let dir = tempdir().unwrap();
        let db_path = create_test_snapshot(dir.path(), vec![FsEntry::new("/f", 0o100644)]);
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("UPDATE entries SET mode = -1", []).unwrap();
        drop(conn);

        let backend = SqliteBackend::open(&db_path, 10).unwrap();
        let mut stream = backend.open_stream(&SortSpec::by_path()).unwrap();
        assert!(matches!(
            stream.fetch_next(),
            Err(SourceError::Decode { .. })
        ));
    }
}

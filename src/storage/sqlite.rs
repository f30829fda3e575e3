//! SQLite store adapter

use std::path::{Path, PathBuf};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, InterruptHandle, OpenFlags, OptionalExtension, Row};
use crate::{Error, Result};
use super::schema;

/// Read-only handle on a messenger database file.
///
/// Not safe for concurrent use: at most one query runs against a store at a
/// time. The handle can be moved to a worker thread and handed back.
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open an existing database file read-only (never creates one)
    pub fn open(path: &Path) -> Result<Self> {
        let open_error = |source: rusqlite::Error| Error::Open {
            path: path.to_path_buf(),
            source,
        };

        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(open_error)?;

        // Opening is lazy; touch the catalog so a non-database file fails here
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(open_error)?;

        tracing::debug!("Opened {} read-only", path.display());
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Handle that aborts the statement currently stepping on this store.
    ///
    /// Usable from any thread, including while the store is owned by a worker.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Abort any running statement. A no-op when nothing is running.
    pub fn interrupt(&self) {
        self.conn.get_interrupt_handle().interrupt();
    }

    // ========== Catalog Operations ==========

    /// Check whether a table exists (exact name match)
    pub fn has_table(&self, table: &str) -> Result<bool> {
        let found: Option<String> = self
            .conn
            .query_row(schema::TABLE_EXISTS_QUERY, [table], |row| row.get(0))
            .optional()
            .query_context("Could not query tables")?;
        Ok(found.is_some())
    }

    /// List the column names of a table; empty if the table does not exist
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(schema::TABLE_COLUMNS_QUERY)
            .query_context("Could not query columns")?;

        let columns = stmt
            .query_map([table], |row| row.text(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .query_context("Could not query columns")?;

        Ok(columns)
    }

    /// Check whether a table has a column (case-sensitive)
    pub fn has_column(&self, table: &str, column: &str) -> Result<bool> {
        Ok(self.table_columns(table)?.iter().any(|name| name == column))
    }

    // ========== Statistics ==========

    /// Count rows of one table
    pub fn count_rows(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .query_context("Could not count rows")?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            chats: self.count_rows("chat")?,
            messages: self.count_rows("message")?,
            identities: self.count_rows("jid")?,
        })
    }
}

/// Typed column readers with the store's native NULL and type coercions.
///
/// NULL text reads as `""`, NULL numbers as `0`, NULL or empty blobs as `None`.
pub trait ColumnReader {
    fn text(&self, idx: usize) -> rusqlite::Result<String>;
    fn int64(&self, idx: usize) -> rusqlite::Result<i64>;
    fn double(&self, idx: usize) -> rusqlite::Result<f64>;
    fn blob(&self, idx: usize) -> rusqlite::Result<Option<Vec<u8>>>;
    fn is_null(&self, idx: usize) -> rusqlite::Result<bool>;
}

impl ColumnReader for Row<'_> {
    fn text(&self, idx: usize) -> rusqlite::Result<String> {
        Ok(match self.get_ref(idx)? {
            ValueRef::Null => String::new(),
            ValueRef::Integer(i) => i.to_string(),
            ValueRef::Real(f) => f.to_string(),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        })
    }

    fn int64(&self, idx: usize) -> rusqlite::Result<i64> {
        Ok(match self.get_ref(idx)? {
            ValueRef::Null | ValueRef::Blob(_) => 0,
            ValueRef::Integer(i) => i,
            ValueRef::Real(f) => f as i64,
            ValueRef::Text(bytes) => parse_number(bytes).map(|f| f as i64).unwrap_or(0),
        })
    }

    fn double(&self, idx: usize) -> rusqlite::Result<f64> {
        Ok(match self.get_ref(idx)? {
            ValueRef::Null | ValueRef::Blob(_) => 0.0,
            ValueRef::Integer(i) => i as f64,
            ValueRef::Real(f) => f,
            ValueRef::Text(bytes) => parse_number(bytes).unwrap_or(0.0),
        })
    }

    fn blob(&self, idx: usize) -> rusqlite::Result<Option<Vec<u8>>> {
        Ok(match self.get_ref(idx)? {
            ValueRef::Null => None,
            ValueRef::Blob(bytes) | ValueRef::Text(bytes) if bytes.is_empty() => None,
            ValueRef::Blob(bytes) | ValueRef::Text(bytes) => Some(bytes.to_vec()),
            ValueRef::Integer(i) => Some(i.to_string().into_bytes()),
            ValueRef::Real(f) => Some(f.to_string().into_bytes()),
        })
    }

    fn is_null(&self, idx: usize) -> rusqlite::Result<bool> {
        Ok(matches!(self.get_ref(idx)?, ValueRef::Null))
    }
}

fn parse_number(bytes: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(bytes).ok()?.trim();
    text.parse::<i64>()
        .map(|i| i as f64)
        .ok()
        .or_else(|| text.parse::<f64>().ok())
}

/// Whether a store error is the outcome of an interrupt request
pub fn is_interrupted(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::OperationInterrupted
    )
}

/// Attach the failing operation to a store error
pub trait QueryContext<T> {
    fn query_context(self, context: &str) -> Result<T>;
}

impl<T> QueryContext<T> for rusqlite::Result<T> {
    fn query_context(self, context: &str) -> Result<T> {
        self.map_err(|source| Error::query(context, source))
    }
}

/// BLAKE3 digest (hex) of a database file, for evidence bookkeeping
pub fn fingerprint(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub chats: usize,
    pub messages: usize,
    pub identities: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Chats: {}", self.chats)?;
        writeln!(f, "  Messages: {}", self.messages)?;
        writeln!(f, "  Identities: {}", self.identities)
    }
}

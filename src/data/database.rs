//! Read-only access to the replay store

use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// How long a query waits for a concurrent writer to release the store
/// before giving up with a busy error.
pub const BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("failed to open replay store at {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Read-only connection to the replay store.
///
/// The store file is owned and written by the ingestion pipeline; this side
/// never creates tables or migrates the schema. The connection is tuned to
/// coexist with that writer: WAL journaling keeps reads non-blocking, and a
/// bounded busy timeout covers the moments the writer holds the lock.
pub struct Database {
    conn: Connection,
    /// Path to the store file
    pub path: PathBuf,
}

impl Database {
    /// Open an existing store read-only.
    ///
    /// A missing or unreadable file is a construction failure, not a
    /// per-query error.
    pub fn open_read_only(path: PathBuf) -> Result<Self, DatabaseError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX
            | OpenFlags::SQLITE_OPEN_URI;
        let conn = Connection::open_with_flags(&path, flags).map_err(|source| {
            DatabaseError::Open {
                path: path.clone(),
                source,
            }
        })?;

        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;

        // The ingestion pipeline writes in WAL mode; a read-only handle can
        // only observe the mode, not change it.
        let journal_mode: String =
            conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        if !journal_mode.eq_ignore_ascii_case("wal") {
            warn!(
                path = %path.display(),
                journal_mode = %journal_mode,
                "replay store is not in WAL mode; concurrent writes may block reads"
            );
        }

        debug!(path = %path.display(), "opened replay store read-only");
        Ok(Self { conn, path })
    }

    /// Borrow the underlying connection (for query execution)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .finish()
    }
}

//! SqliteBuffer - `FrameStore` on an embedded SQLite file

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use contracts::{BufferError, BufferRow, FrameStore};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, instrument, warn};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS offline_buffer (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp INTEGER NOT NULL,
    payload   BLOB    NOT NULL
);";

/// Durable ordered frame buffer
///
/// Every `append` is its own committed transaction with `synchronous=FULL`,
/// so an acknowledged row survives a crash or power loss.
pub struct SqliteBuffer {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    max_rows: Option<u64>,
}

impl SqliteBuffer {
    /// Open or create the buffer file. Failure is fatal for the agent.
    #[instrument(name = "buffer_open", skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path, max_rows: Option<u64>) -> Result<Self, BufferError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| open_error(path, e))?;
        }

        let conn = Connection::open(path).map_err(|e| open_error(path, e))?;
        Self::init(&conn).map_err(|e| open_error(path, e))?;

        let buffer = Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
            max_rows,
        };

        let rows = buffer.len()?;
        info!(path = %path.display(), rows, max_rows = ?max_rows, "Offline buffer opened");
        Ok(buffer)
    }

    /// Non-durable buffer for tests and dry runs
    pub fn open_in_memory(max_rows: Option<u64>) -> Result<Self, BufferError> {
        let conn = Connection::open_in_memory().map_err(|e| open_error(Path::new(":memory:"), e))?;
        Self::init(&conn).map_err(|e| open_error(Path::new(":memory:"), e))?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
            max_rows,
        })
    }

    /// Backing file, `None` when in memory
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        // In-memory databases report "memory" here; both are fine.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch(SCHEMA)?;
        debug!(journal_mode = %mode, "Buffer schema ready");
        Ok(())
    }

    fn lock(&self, operation: &'static str) -> Result<MutexGuard<'_, Connection>, BufferError> {
        self.conn
            .lock()
            .map_err(|_| BufferError::storage(operation, "connection lock poisoned"))
    }

    /// Drop the oldest rows beyond the cap, returns how many were removed
    fn evict(conn: &Connection, max_rows: u64) -> rusqlite::Result<usize> {
        conn.execute(
            "DELETE FROM offline_buffer WHERE id <= (
                SELECT id FROM offline_buffer ORDER BY id DESC LIMIT 1 OFFSET ?1
            )",
            params![max_rows as i64],
        )
    }
}

fn open_error(path: &Path, e: impl std::fmt::Display) -> BufferError {
    BufferError::open(path.display().to_string(), e.to_string())
}

impl FrameStore for SqliteBuffer {
    fn append(&self, timestamp: u64, payload: &[u8]) -> Result<i64, BufferError> {
        let timestamp = i64::try_from(timestamp)
            .map_err(|_| BufferError::storage("append", format!("timestamp {timestamp} exceeds i64")))?;

        let conn = self.lock("append")?;
        conn.execute(
            "INSERT INTO offline_buffer (timestamp, payload) VALUES (?1, ?2)",
            params![timestamp, payload],
        )
        .map_err(|e| BufferError::storage("append", e.to_string()))?;
        let id = conn.last_insert_rowid();

        // Row is committed; a failed eviction only leaves the buffer over cap.
        if let Some(max_rows) = self.max_rows {
            match Self::evict(&conn, max_rows) {
                Ok(0) => {}
                Ok(evicted) => {
                    metrics::counter!("telemetry_agent_buffer_evicted_total").increment(evicted as u64);
                    warn!(evicted, max_rows, "Buffer cap reached, oldest rows evicted");
                }
                Err(e) => {
                    metrics::counter!("telemetry_agent_buffer_errors_total", "operation" => "evict")
                        .increment(1);
                    warn!(id, max_rows, error = %e, "Buffer eviction failed, row kept over cap");
                }
            }
        }

        Ok(id)
    }

    fn first_after(&self, after: Option<i64>) -> Result<Option<BufferRow>, BufferError> {
        let conn = self.lock("scan")?;
        conn.query_row(
            "SELECT id, timestamp, payload FROM offline_buffer
             WHERE id > ?1 ORDER BY id ASC LIMIT 1",
            params![after.unwrap_or(i64::MIN)],
            |row| {
                Ok(BufferRow {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    payload: Bytes::from(row.get::<_, Vec<u8>>(2)?),
                })
            },
        )
        .optional()
        .map_err(|e| BufferError::storage("scan", e.to_string()))
    }

    fn remove(&self, id: i64) -> Result<(), BufferError> {
        let conn = self.lock("remove")?;
        conn.execute("DELETE FROM offline_buffer WHERE id = ?1", params![id])
            .map_err(|e| BufferError::storage("remove", e.to_string()))?;
        Ok(())
    }

    fn len(&self) -> Result<u64, BufferError> {
        let conn = self.lock("count")?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM offline_buffer", [], |row| row.get(0))
            .map_err(|e| BufferError::storage("count", e.to_string()))?;
        Ok(count as u64)
    }
}

pub mod migrations;
pub mod pool;
pub mod schema;

use crate::error::{MemoryError, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the tabula database at the given path, with pragmas
/// applied and schema initialized.
///
/// WAL journaling gives concurrent readers with a single serialized writer;
/// the busy timeout absorbs brief writer contention instead of failing with
/// SQLITE_BUSY immediately.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            MemoryError::StorageIntegrity(format!(
                "failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let conn = Connection::open(path).map_err(|e| {
        MemoryError::StorageIntegrity(format!(
            "failed to open database at {}: {e}",
            path.display()
        ))
    })?;

    // SQLite opens lazily; a corrupt or non-database file only surfaces once
    // we touch it. Treat any failure during setup as an integrity failure —
    // the operator must intervene before the service can run.
    apply_pragmas(&conn)
        .and_then(|_| schema::init_schema(&conn))
        .and_then(|_| migrations::run_migrations(&conn))
        .map_err(|e| {
            MemoryError::StorageIntegrity(format!(
                "database at {} is unreadable or corrupt: {e}",
                path.display()
            ))
        })?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Connection pragmas, applied to every connection (pooled or direct).
pub(crate) fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}

/// Run `PRAGMA integrity_check` and report whether the store is sound.
pub fn integrity_check(conn: &Connection) -> Result<bool> {
    let result: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    Ok(result == "ok")
}

/// Open an in-memory database for testing.
#[cfg(test)]
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    schema::init_schema(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

//! Per-table capacity enforcement.
//!
//! Two policies, applied inside the caller's transaction so the count
//! invariants hold at commit time:
//!
//! - the decision log is a ring buffer: at the cap, the single oldest row is
//!   evicted to make room, and a new decision is never rejected;
//! - keyed tables (patterns, context) are a fixed vocabulary: a new key at
//!   the cap is rejected, while updating an existing key always succeeds.

use crate::error::{MemoryError, Result};
use rusqlite::{params, Connection};

/// The two keyed tables subject to reject-at-capacity policy.
#[derive(Debug, Clone, Copy)]
pub enum KeyedTable {
    Patterns,
    Context,
}

impl KeyedTable {
    pub fn name(self) -> &'static str {
        match self {
            Self::Patterns => "patterns",
            Self::Context => "context",
        }
    }

    fn count_sql(self) -> &'static str {
        match self {
            Self::Patterns => "SELECT COUNT(*) FROM patterns",
            Self::Context => "SELECT COUNT(*) FROM context",
        }
    }

    fn exists_sql(self) -> &'static str {
        match self {
            Self::Patterns => "SELECT COUNT(*) > 0 FROM patterns WHERE name = ?1",
            Self::Context => "SELECT COUNT(*) > 0 FROM context WHERE key = ?1",
        }
    }
}

/// Make room for one new decision: while the table is at or above `max`,
/// delete the oldest rows (lowest id). Returns how many rows were evicted.
pub fn evict_decisions_for_insert(conn: &Connection, max: usize) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM decisions", [], |row| row.get(0))?;
    if (count as usize) < max {
        return Ok(0);
    }

    // Normally exactly one row; more only if the configured max was lowered
    // since the table filled.
    let excess = count as usize - max + 1;
    let evicted = conn.execute(
        "DELETE FROM decisions WHERE id IN (
             SELECT id FROM decisions ORDER BY id ASC LIMIT ?1
         )",
        params![excess as i64],
    )?;

    tracing::debug!(evicted, "evicted oldest decisions at capacity");
    Ok(evicted)
}

/// Reject an insert of a *new* key when the table is at capacity. Existing
/// keys pass unconditionally — replacing a record never changes the count.
pub fn check_keyed_capacity(
    conn: &Connection,
    table: KeyedTable,
    key: &str,
    max: usize,
) -> Result<()> {
    let exists: bool = conn.query_row(table.exists_sql(), params![key], |row| row.get(0))?;
    if exists {
        return Ok(());
    }

    let count: i64 = conn.query_row(table.count_sql(), [], |row| row.get(0))?;
    if count as usize >= max {
        return Err(MemoryError::CapacityExceeded {
            table: table.name(),
            limit: max,
        });
    }

    Ok(())
}

//! Destructive wipe of all three tables, gated by an exact confirmation token.

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::error::{MemoryError, Result};

/// The literal value a caller must supply to confirm a purge.
pub const CONFIRM_TOKEN: &str = "CONFIRM_PURGE";

/// Result returned from a purge, with per-table deletion counts.
#[derive(Debug, Serialize)]
pub struct PurgeResult {
    pub decisions_deleted: u64,
    pub patterns_deleted: u64,
    pub context_deleted: u64,
}

/// Empty all three tables in one transaction, then VACUUM to reclaim space.
///
/// Requires `confirm == "CONFIRM_PURGE"` exactly; anything else leaves the
/// store untouched. Purging an already-empty store is a successful no-op.
pub fn purge_memory(conn: &mut Connection, confirm: &str) -> Result<PurgeResult> {
    if confirm != CONFIRM_TOKEN {
        return Err(MemoryError::Permission(format!(
            "purge requires confirm={CONFIRM_TOKEN:?}"
        )));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let decisions_deleted = tx.execute("DELETE FROM decisions", [])? as u64;
    let patterns_deleted = tx.execute("DELETE FROM patterns", [])? as u64;
    let context_deleted = tx.execute("DELETE FROM context", [])? as u64;
    tx.commit()?;

    // VACUUM cannot run inside a transaction.
    conn.execute_batch("VACUUM")?;

    tracing::warn!(
        decisions_deleted,
        patterns_deleted,
        context_deleted,
        "memory purged"
    );

    Ok(PurgeResult {
        decisions_deleted,
        patterns_deleted,
        context_deleted,
    })
}

//! Key/value project context: set and get.

use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::memory::capacity::{self, KeyedTable};
use crate::memory::validate::{require_text, validate_key};
use crate::memory::now_rfc3339;

/// Result returned from a set-context operation.
#[derive(Debug, Serialize)]
pub struct SetContextResult {
    pub key: String,
    pub replaced: bool,
}

/// Set (or overwrite) a context key. Only a genuinely new key counts against
/// the capacity limit.
pub fn set_context(
    conn: &mut Connection,
    key: &str,
    value: &str,
    max_context_keys: usize,
) -> Result<SetContextResult> {
    validate_key(key)?;
    let value = require_text("value", value)?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    capacity::check_keyed_capacity(&tx, KeyedTable::Context, key, max_context_keys)?;

    let existed: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM context WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )?;

    tx.execute(
        "INSERT INTO context (key, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
             value = excluded.value,
             updated_at = excluded.updated_at",
        params![key, value, now_rfc3339()],
    )?;

    tx.commit()?;

    tracing::info!(key, replaced = existed, "context set");
    Ok(SetContextResult {
        key: key.to_string(),
        replaced: existed,
    })
}

/// All context entries as a sorted key → value map.
pub fn get_context(conn: &Connection) -> Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM context")?;
    let entries = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    Ok(entries)
}

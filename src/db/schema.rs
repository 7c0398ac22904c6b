//! SQL DDL for all tabula tables.
//!
//! Defines the `decisions`, `patterns`, `context`, and `schema_meta` tables.
//! All DDL uses `IF NOT EXISTS` for idempotent initialization. The
//! `rate_limit_ops` table is added by migration v2 (see [`crate::db::migrations`]).

use rusqlite::Connection;

/// Baseline schema DDL for the three memory tables plus metadata.
const SCHEMA_SQL: &str = r#"
-- Append-only decision log. AUTOINCREMENT guarantees ids are strictly
-- increasing and never reused, even after eviction of old rows.
CREATE TABLE IF NOT EXISTS decisions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at TEXT NOT NULL,
    decision TEXT NOT NULL,
    rationale TEXT NOT NULL,
    context TEXT NOT NULL DEFAULT '',
    alternatives TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_decisions_created ON decisions(created_at);

-- Named, replace-in-place pattern records.
CREATE TABLE IF NOT EXISTS patterns (
    name TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    example TEXT NOT NULL DEFAULT '',
    when_to_use TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
);

-- Key/value project context.
CREATE TABLE IF NOT EXISTS context (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all baseline tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}

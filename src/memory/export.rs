//! Versioned export/import of the whole store.
//!
//! Export reads all three tables inside one transaction for a consistent
//! snapshot. Import is an atomic full replace: the blob's contents become the
//! new state, or — on any validation failure — nothing changes. Every field
//! passes back through the validation layer, so a tampered export cannot
//! smuggle in oversized text or illegal keys.

use rusqlite::{params, Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::{MemoryError, Result};
use crate::memory::stats::{self, MemoryStats};
use crate::memory::types::{Decision, Pattern};
use crate::memory::validate::{is_valid_key, sanitize_text, MAX_TEXT_LEN};
use crate::memory::now_rfc3339;

/// Version of the export blob layout. Bumped on incompatible changes.
pub const EXPORT_FORMAT_VERSION: u32 = 1;

/// Imports larger than this are rejected before parsing.
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

/// A full, versioned snapshot of the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportBlob {
    pub format_version: u32,
    pub app_version: String,
    pub exported_at: String,
    pub decisions: Vec<Decision>,
    pub patterns: Vec<Pattern>,
    pub context: BTreeMap<String, String>,
    pub stats: MemoryStats,
}

/// Per-table counts applied by an import.
#[derive(Debug, Serialize)]
pub struct ImportResult {
    pub decisions_imported: u64,
    pub patterns_imported: u64,
    pub context_imported: u64,
    /// Decisions dropped from the head of an oversized blob (ring-buffer
    /// semantics: the newest `max_decisions` entries win).
    pub decisions_dropped: u64,
}

/// Snapshot the whole store.
pub fn export_memory(
    conn: &mut Connection,
    limits: &LimitsConfig,
    db_path: Option<&Path>,
) -> Result<ExportBlob> {
    let tx = conn.transaction()?;

    let mut stmt = tx.prepare(
        "SELECT id, created_at, decision, rationale, context, alternatives
         FROM decisions ORDER BY id ASC",
    )?;
    let decisions = stmt
        .query_map([], |row| {
            Ok(Decision {
                id: row.get(0)?,
                created_at: row.get(1)?,
                decision: row.get(2)?,
                rationale: row.get(3)?,
                context: row.get(4)?,
                alternatives: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut stmt = tx.prepare(
        "SELECT name, description, example, when_to_use, updated_at
         FROM patterns ORDER BY name",
    )?;
    let patterns = stmt
        .query_map([], |row| {
            Ok(Pattern {
                name: row.get(0)?,
                description: row.get(1)?,
                example: row.get(2)?,
                when_to_use: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    drop(stmt);

    let mut stmt = tx.prepare("SELECT key, value FROM context")?;
    let context = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<BTreeMap<_, _>, _>>()?;
    drop(stmt);

    let stats = stats::memory_stats(&tx, limits, db_path)?;

    tx.commit()?;

    tracing::info!(
        decisions = decisions.len(),
        patterns = patterns.len(),
        context = context.len(),
        "memory exported"
    );

    Ok(ExportBlob {
        format_version: EXPORT_FORMAT_VERSION,
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        exported_at: now_rfc3339(),
        decisions,
        patterns,
        context,
        stats,
    })
}

/// Parse and version-check an import payload without touching the store.
pub fn parse_blob(json: &str) -> Result<ExportBlob> {
    if json.len() > MAX_IMPORT_BYTES {
        return Err(MemoryError::Validation(format!(
            "import payload too large: {} bytes exceeds the {} byte limit",
            json.len(),
            MAX_IMPORT_BYTES
        )));
    }

    let blob: ExportBlob = serde_json::from_str(json)
        .map_err(|e| MemoryError::Validation(format!("invalid import JSON: {e}")))?;

    if blob.format_version != EXPORT_FORMAT_VERSION {
        return Err(MemoryError::SchemaVersion {
            found: blob.format_version,
            expected: EXPORT_FORMAT_VERSION,
        });
    }

    Ok(blob)
}

/// Atomically replace the store's contents with the blob's.
///
/// Validation runs before any row is touched; capacity rules match live
/// writes (decisions evict from the oldest end, keyed tables reject
/// overflow), so the import can never leave the store over its limits.
pub fn import_memory(
    conn: &mut Connection,
    blob: ExportBlob,
    limits: &LimitsConfig,
) -> Result<ImportResult> {
    // Keyed tables reject overflow outright, before the transaction starts.
    if blob.patterns.len() > limits.max_patterns {
        return Err(MemoryError::CapacityExceeded {
            table: "patterns",
            limit: limits.max_patterns,
        });
    }
    if blob.context.len() > limits.max_context_keys {
        return Err(MemoryError::CapacityExceeded {
            table: "context",
            limit: limits.max_context_keys,
        });
    }

    // Re-validate every key exactly as a live write would.
    for pattern in &blob.patterns {
        if !is_valid_key(&pattern.name) {
            return Err(MemoryError::Validation(format!(
                "import rejected: invalid pattern name {:?}",
                pattern.name
            )));
        }
    }
    for key in blob.context.keys() {
        if !is_valid_key(key) {
            return Err(MemoryError::Validation(format!(
                "import rejected: invalid context key {key:?}"
            )));
        }
    }
    for (index, decision) in blob.decisions.iter().enumerate() {
        if sanitize_text(&decision.decision, MAX_TEXT_LEN).is_empty()
            || sanitize_text(&decision.rationale, MAX_TEXT_LEN).is_empty()
        {
            return Err(MemoryError::Validation(format!(
                "import rejected: decision at index {index} has an empty decision or rationale"
            )));
        }
    }

    // Oversized decision lists keep the newest entries, matching the
    // ring-buffer policy.
    let total = blob.decisions.len();
    let skip = total.saturating_sub(limits.max_decisions);
    let decisions = &blob.decisions[skip..];
    if skip > 0 {
        tracing::warn!(
            dropped = skip,
            kept = decisions.len(),
            "import blob exceeds max_decisions; keeping newest entries"
        );
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute("DELETE FROM decisions", [])?;
    tx.execute("DELETE FROM patterns", [])?;
    tx.execute("DELETE FROM context", [])?;

    let mut decisions_imported = 0u64;
    for decision in decisions {
        let created_at = if decision.created_at.trim().is_empty() {
            now_rfc3339()
        } else {
            decision.created_at.clone()
        };
        tx.execute(
            "INSERT INTO decisions (created_at, decision, rationale, context, alternatives)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                created_at,
                sanitize_text(&decision.decision, MAX_TEXT_LEN),
                sanitize_text(&decision.rationale, MAX_TEXT_LEN),
                sanitize_text(&decision.context, MAX_TEXT_LEN),
                sanitize_text(&decision.alternatives, MAX_TEXT_LEN),
            ],
        )?;
        decisions_imported += 1;
    }

    let mut patterns_imported = 0u64;
    for pattern in &blob.patterns {
        tx.execute(
            "INSERT OR REPLACE INTO patterns (name, description, example, when_to_use, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                pattern.name,
                sanitize_text(&pattern.description, MAX_TEXT_LEN),
                sanitize_text(&pattern.example, MAX_TEXT_LEN),
                sanitize_text(&pattern.when_to_use, MAX_TEXT_LEN),
                now_rfc3339(),
            ],
        )?;
        patterns_imported += 1;
    }

    let mut context_imported = 0u64;
    for (key, value) in &blob.context {
        tx.execute(
            "INSERT OR REPLACE INTO context (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, sanitize_text(value, MAX_TEXT_LEN), now_rfc3339()],
        )?;
        context_imported += 1;
    }

    tx.commit()?;

    tracing::info!(
        decisions_imported,
        patterns_imported,
        context_imported,
        "memory imported (full replace)"
    );

    Ok(ImportResult {
        decisions_imported,
        patterns_imported,
        context_imported,
        decisions_dropped: skip as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::memory::{context, decisions, patterns};

    fn limits() -> LimitsConfig {
        LimitsConfig {
            max_decisions: 100,
            max_patterns: 10,
            max_context_keys: 10,
        }
    }

    fn populated_db() -> Connection {
        let mut conn = db::open_memory_database().unwrap();
        decisions::remember_decision(&mut conn, "use sqlite", "embedded", None, None, 100)
            .unwrap();
        decisions::remember_decision(&mut conn, "use WAL", "readers", None, None, 100).unwrap();
        patterns::store_pattern(&mut conn, "errors", "thiserror enums", None, None, 10)
            .unwrap();
        context::set_context(&mut conn, "lang", "rust", 10).unwrap();
        conn
    }

    #[test]
    fn export_captures_everything() {
        let mut conn = populated_db();
        let blob = export_memory(&mut conn, &limits(), None).unwrap();

        assert_eq!(blob.format_version, EXPORT_FORMAT_VERSION);
        assert_eq!(blob.decisions.len(), 2);
        assert_eq!(blob.patterns.len(), 1);
        assert_eq!(blob.context.len(), 1);
        assert_eq!(blob.stats.decisions, 2);
        // decisions exported oldest-first
        assert!(blob.decisions[0].id < blob.decisions[1].id);
    }

    #[test]
    fn round_trip_reproduces_stats() {
        let mut conn = populated_db();
        let blob = export_memory(&mut conn, &limits(), None).unwrap();
        let json = serde_json::to_string(&blob).unwrap();

        let mut fresh = db::open_memory_database().unwrap();
        let parsed = parse_blob(&json).unwrap();
        let result = import_memory(&mut fresh, parsed, &limits()).unwrap();
        assert_eq!(result.decisions_imported, 2);
        assert_eq!(result.patterns_imported, 1);
        assert_eq!(result.context_imported, 1);

        let original = stats::memory_stats(&conn, &limits(), None).unwrap();
        let restored = stats::memory_stats(&fresh, &limits(), None).unwrap();
        assert_eq!(original.decisions, restored.decisions);
        assert_eq!(original.patterns, restored.patterns);
        assert_eq!(original.context_keys, restored.context_keys);
    }

    #[test]
    fn import_replaces_existing_state() {
        let mut source = db::open_memory_database().unwrap();
        decisions::remember_decision(&mut source, "only this", "r", None, None, 100).unwrap();
        let blob = export_memory(&mut source, &limits(), None).unwrap();

        let mut target = populated_db();
        import_memory(&mut target, blob, &limits()).unwrap();

        let recalled = decisions::recall_decisions(&target, None, None).unwrap();
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].decision, "only this");
        assert!(context::get_context(&target).unwrap().is_empty());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let mut conn = populated_db();
        let mut blob = export_memory(&mut conn, &limits(), None).unwrap();
        blob.format_version = 99;
        let json = serde_json::to_string(&blob).unwrap();

        let err = parse_blob(&json).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::SchemaVersion {
                found: 99,
                expected: EXPORT_FORMAT_VERSION
            }
        ));
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        assert!(matches!(
            parse_blob("{not json").unwrap_err(),
            MemoryError::Validation(_)
        ));
        assert!(matches!(
            parse_blob("{\"format_version\": 1}").unwrap_err(),
            MemoryError::Validation(_)
        ));
    }

    #[test]
    fn tampered_key_aborts_import_atomically() {
        let mut conn = populated_db();
        let mut blob = export_memory(&mut conn, &limits(), None).unwrap();
        blob.patterns[0].name = "bad name!".into();
        let json = serde_json::to_string(&blob).unwrap();

        let mut target = db::open_memory_database().unwrap();
        decisions::remember_decision(&mut target, "survives", "r", None, None, 100).unwrap();

        let parsed = parse_blob(&json).unwrap();
        let err = import_memory(&mut target, parsed, &limits()).unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));

        // prior state untouched
        let recalled = decisions::recall_decisions(&target, None, None).unwrap();
        assert_eq!(recalled.len(), 1);
        assert_eq!(recalled[0].decision, "survives");
    }

    #[test]
    fn oversized_decisions_keep_newest() {
        let mut conn = db::open_memory_database().unwrap();
        for i in 1..=5 {
            decisions::remember_decision(&mut conn, &format!("D{i}"), "r", None, None, 100)
                .unwrap();
        }
        let blob = export_memory(&mut conn, &limits(), None).unwrap();

        let small = LimitsConfig {
            max_decisions: 3,
            max_patterns: 10,
            max_context_keys: 10,
        };
        let mut target = db::open_memory_database().unwrap();
        let result = import_memory(&mut target, blob, &small).unwrap();
        assert_eq!(result.decisions_imported, 3);
        assert_eq!(result.decisions_dropped, 2);

        let recalled = decisions::recall_decisions(&target, None, None).unwrap();
        let texts: Vec<&str> = recalled.iter().map(|d| d.decision.as_str()).collect();
        assert_eq!(texts, vec!["D5", "D4", "D3"]);
    }

    #[test]
    fn oversized_keyed_tables_are_rejected() {
        let mut conn = db::open_memory_database().unwrap();
        for i in 0..3 {
            patterns::store_pattern(&mut conn, &format!("p{i}"), "d", None, None, 10).unwrap();
        }
        let blob = export_memory(&mut conn, &limits(), None).unwrap();

        let small = LimitsConfig {
            max_decisions: 100,
            max_patterns: 2,
            max_context_keys: 10,
        };
        let mut target = db::open_memory_database().unwrap();
        let err = import_memory(&mut target, blob, &small).unwrap_err();
        assert!(matches!(
            err,
            MemoryError::CapacityExceeded { table: "patterns", .. }
        ));
    }
}

//! The append-only decision log: remember and recall.
//!
//! [`remember_decision`] runs the full write path inside one transaction:
//! sanitize inputs, evict at capacity, insert. [`recall_decisions`] is a
//! read-only keyword search ordered most-recent-first.

use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use crate::error::Result;
use crate::memory::types::Decision;
use crate::memory::validate::{
    escape_like, require_text, sanitize_text, MAX_KEYWORD_LEN, MAX_TEXT_LEN,
};
use crate::memory::{capacity, now_rfc3339};

/// Default and maximum result counts for recall.
pub const DEFAULT_RECALL_LIMIT: usize = 20;
pub const MAX_RECALL_LIMIT: usize = 100;

/// Result returned from a remember operation.
#[derive(Debug, Serialize)]
pub struct RememberDecisionResult {
    /// Storage-assigned id of the new decision.
    pub id: i64,
    /// Number of old decisions evicted to make room (normally 0 or 1).
    pub evicted: usize,
}

/// Append a decision to the log. At capacity the oldest row is evicted first,
/// so a new decision is never rejected for space.
pub fn remember_decision(
    conn: &mut Connection,
    decision: &str,
    rationale: &str,
    context: Option<&str>,
    alternatives: Option<&str>,
    max_decisions: usize,
) -> Result<RememberDecisionResult> {
    let decision = require_text("decision", decision)?;
    let rationale = require_text("rationale", rationale)?;
    let context = sanitize_text(context.unwrap_or(""), MAX_TEXT_LEN);
    let alternatives = sanitize_text(alternatives.unwrap_or(""), MAX_TEXT_LEN);

    // Immediate mode takes the write lock up front, so the capacity check
    // and insert see the same state even under writer contention.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let evicted = capacity::evict_decisions_for_insert(&tx, max_decisions)?;

    tx.execute(
        "INSERT INTO decisions (created_at, decision, rationale, context, alternatives)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![now_rfc3339(), decision, rationale, context, alternatives],
    )?;
    let id = tx.last_insert_rowid();

    tx.commit()?;

    tracing::info!(id, evicted, "decision stored");
    Ok(RememberDecisionResult { id, evicted })
}

/// Recall decisions, newest first.
///
/// With a keyword, matches case-insensitively against decision, rationale,
/// and context (LIKE is case-insensitive for ASCII in SQLite). Wildcards in
/// the keyword are escaped so input matches literally.
pub fn recall_decisions(
    conn: &Connection,
    keyword: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<Decision>> {
    let limit = limit
        .unwrap_or(DEFAULT_RECALL_LIMIT)
        .clamp(1, MAX_RECALL_LIMIT);

    let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<Decision> {
        Ok(Decision {
            id: row.get(0)?,
            created_at: row.get(1)?,
            decision: row.get(2)?,
            rationale: row.get(3)?,
            context: row.get(4)?,
            alternatives: row.get(5)?,
        })
    };

    let keyword = keyword
        .map(|k| sanitize_text(k, MAX_KEYWORD_LEN))
        .filter(|k| !k.is_empty());

    let decisions = match keyword {
        Some(kw) => {
            let pattern = format!("%{}%", escape_like(&kw));
            let mut stmt = conn.prepare(
                "SELECT id, created_at, decision, rationale, context, alternatives
                 FROM decisions
                 WHERE decision LIKE ?1 ESCAPE '\\'
                    OR rationale LIKE ?1 ESCAPE '\\'
                    OR context LIKE ?1 ESCAPE '\\'
                 ORDER BY id DESC LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![pattern, limit as i64], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, created_at, decision, rationale, context, alternatives
                 FROM decisions ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit as i64], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    Ok(decisions)
}

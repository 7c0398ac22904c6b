//! Table counts, limits, and utilization.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::Result;

/// Snapshot of store occupancy against its configured limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub decisions: u64,
    pub patterns: u64,
    pub context_keys: u64,
    pub limits: StatsLimits,
    pub utilization_percent: Utilization,
    /// Size of the backing file in bytes; 0 for in-memory stores.
    pub db_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsLimits {
    pub max_decisions: usize,
    pub max_patterns: usize,
    pub max_context_keys: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utilization {
    pub decisions: f64,
    pub patterns: f64,
    pub context: f64,
}

impl Utilization {
    /// Highest utilization across the three tables.
    pub fn peak(&self) -> f64 {
        self.decisions.max(self.patterns).max(self.context)
    }
}

/// Compute store statistics. `db_path` is used for file size; pass `None`
/// for in-memory databases.
pub fn memory_stats(
    conn: &Connection,
    limits: &LimitsConfig,
    db_path: Option<&Path>,
) -> Result<MemoryStats> {
    let decisions = count(conn, "SELECT COUNT(*) FROM decisions")?;
    let patterns = count(conn, "SELECT COUNT(*) FROM patterns")?;
    let context_keys = count(conn, "SELECT COUNT(*) FROM context")?;

    let db_size_bytes = db_path
        .and_then(|p| std::fs::metadata(p).ok())
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(MemoryStats {
        decisions,
        patterns,
        context_keys,
        limits: StatsLimits {
            max_decisions: limits.max_decisions,
            max_patterns: limits.max_patterns,
            max_context_keys: limits.max_context_keys,
        },
        utilization_percent: Utilization {
            decisions: percent(decisions, limits.max_decisions),
            patterns: percent(patterns, limits.max_patterns),
            context: percent(context_keys, limits.max_context_keys),
        },
        db_size_bytes,
    })
}

fn count(conn: &Connection, sql: &str) -> Result<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as u64)
}

fn percent(count: u64, max: usize) -> f64 {
    if max == 0 {
        return 100.0;
    }
    (count as f64 / max as f64 * 1000.0).round() / 10.0
}

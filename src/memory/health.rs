//! Liveness and capacity reporting.
//!
//! Three-level status: `healthy`, `degraded` (any table past the warning
//! threshold), `unhealthy` (integrity failure, no connection, or writes
//! broken). The write probe runs in a rolled-back transaction so checking
//! health never mutates the store.

use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

use crate::config::LimitsConfig;
use crate::db;
use crate::error::Result;
use crate::memory::stats::{self, Utilization};

/// Utilization percentage above which a table flips the status to degraded.
pub const CAPACITY_WARN_PERCENT: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub connection: String,
    pub integrity: String,
    pub write_capability: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_percent: Option<Utilization>,
}

impl HealthReport {
    /// Report for the case where no pooled connection could be acquired.
    pub fn connection_failed(detail: &str) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            checks: HealthChecks {
                connection: format!("failed: {detail}"),
                integrity: "skipped".into(),
                write_capability: "skipped".into(),
                capacity_percent: None,
            },
        }
    }
}

/// Run all checks over an already-acquired connection.
pub fn health_check(
    conn: &mut Connection,
    limits: &LimitsConfig,
    read_only: bool,
) -> Result<HealthReport> {
    let mut status = HealthStatus::Healthy;

    let integrity = match db::integrity_check(conn) {
        Ok(true) => "ok".to_string(),
        Ok(false) => {
            status = HealthStatus::Unhealthy;
            "failed".to_string()
        }
        Err(e) => {
            status = HealthStatus::Unhealthy;
            format!("failed: {e}")
        }
    };

    let write_capability = if read_only {
        "skipped (read-only)".to_string()
    } else {
        match write_probe(conn) {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                status = HealthStatus::Unhealthy;
                format!("failed: {e}")
            }
        }
    };

    let memory_stats = stats::memory_stats(conn, limits, None)?;
    let capacity = memory_stats.utilization_percent;
    if status == HealthStatus::Healthy && capacity.peak() > CAPACITY_WARN_PERCENT {
        status = HealthStatus::Degraded;
    }

    Ok(HealthReport {
        status,
        checks: HealthChecks {
            connection: "ok".into(),
            integrity,
            write_capability,
            capacity_percent: Some(capacity),
        },
    })
}

/// Insert and remove a sentinel row, then roll the transaction back.
fn write_probe(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute(
        "INSERT OR REPLACE INTO context (key, value, updated_at) VALUES ('_health_probe', 'x', 'x')",
        [],
    )?;
    tx.execute("DELETE FROM context WHERE key = '_health_probe'", [])?;
    tx.rollback()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::context;

    fn limits(max_context: usize) -> LimitsConfig {
        LimitsConfig {
            max_decisions: 10,
            max_patterns: 10,
            max_context_keys: max_context,
        }
    }

    #[test]
    fn fresh_store_is_healthy() {
        let mut conn = db::open_memory_database().unwrap();
        let report = health_check(&mut conn, &limits(10), false).unwrap();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.checks.connection, "ok");
        assert_eq!(report.checks.integrity, "ok");
        assert_eq!(report.checks.write_capability, "ok");
    }

    #[test]
    fn near_capacity_reports_degraded() {
        let mut conn = db::open_memory_database().unwrap();
        context::set_context(&mut conn, "only", "key", 1).unwrap();

        let report = health_check(&mut conn, &limits(1), false).unwrap();
        assert_eq!(report.status, HealthStatus::Degraded);
        let capacity = report.checks.capacity_percent.unwrap();
        assert_eq!(capacity.context, 100.0);
    }

    #[test]
    fn read_only_skips_write_probe() {
        let mut conn = db::open_memory_database().unwrap();
        let report = health_check(&mut conn, &limits(10), true).unwrap();
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.checks.write_capability, "skipped (read-only)");
    }

    #[test]
    fn write_probe_leaves_no_trace() {
        let mut conn = db::open_memory_database().unwrap();
        health_check(&mut conn, &limits(10), false).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM context", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn connection_failed_report_is_unhealthy() {
        let report = HealthReport::connection_failed("timeout after 250ms");
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.checks.connection.starts_with("failed"));
    }
}

//! Process-wide service state and operation dispatch.
//!
//! One [`ServiceContext`] is built at startup and shared by every caller (MCP
//! tools, CLI commands). It owns the connection pool and rate limiter and
//! runs each operation through the same gauntlet: read-only gate → rate limit
//! → pool acquire → memory operation → structured response. Rate-limited
//! rejections happen before a connection is acquired, so abusive callers
//! never consume pool capacity.

use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::TabulaConfig;
use crate::db;
use crate::db::pool::{ConnectionPool, PoolStatus};
use crate::error::{MemoryError, Result};
use crate::limiter::{LimiterSnapshot, RateLimiter};
use crate::memory::health::HealthReport;
use crate::memory::stats::MemoryStats;
use crate::memory::{context, decisions, export, health, patterns, purge, stats};
use crate::protocol::Operation;

/// Timeout for the health check's connection probe; deliberately short so an
/// exhausted pool reports unhealthy instead of stalling the check.
const HEALTH_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(2);

/// Combined statistics: store occupancy plus pool and limiter state.
#[derive(Debug, Serialize)]
pub struct ServiceStats {
    #[serde(flatten)]
    pub memory: MemoryStats,
    pub pool: PoolStatus,
    pub rate_limit: LimiterSnapshot,
}

pub struct ServiceContext {
    config: TabulaConfig,
    db_path: PathBuf,
    pool: ConnectionPool,
    limiter: RateLimiter,
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl ServiceContext {
    /// Initialize the database, warm the pool, and build the limiter.
    ///
    /// A backing file that fails its integrity check is fatal here: the
    /// process must not serve from a corrupt store.
    pub fn new(config: TabulaConfig) -> Result<Self> {
        let db_path = config.resolved_db_path();

        let conn = db::open_database(&db_path)?;
        if !db::integrity_check(&conn)? {
            return Err(MemoryError::StorageIntegrity(format!(
                "integrity check failed for {}",
                db_path.display()
            )));
        }
        drop(conn);

        let pool = ConnectionPool::open(
            &db_path,
            config.pool.size,
            Duration::from_secs(config.pool.acquire_timeout_secs),
        )?;
        let limiter = RateLimiter::from_config(&config.rate_limit, &db_path);

        tracing::info!(
            db = %db_path.display(),
            pool_size = config.pool.size,
            rate_limit = config.rate_limit.ops_per_minute,
            read_only = config.storage.read_only,
            "service context ready"
        );

        Ok(Self {
            config,
            db_path,
            pool,
            limiter,
        })
    }

    /// Run one operation to completion, fully applied or fully rejected.
    pub fn dispatch(&self, op: Operation) -> Result<Value> {
        let kind = op.kind();

        if self.config.storage.read_only && kind.is_write() {
            return Err(MemoryError::Permission(format!(
                "{} rejected: service is in read-only mode",
                kind.name()
            )));
        }

        if kind.rate_limited() {
            let decision = self.limiter.allow(1);
            if !decision.allowed {
                tracing::warn!(op = kind.name(), "rate limit exceeded");
                return Err(MemoryError::RateLimitExceeded {
                    limit: self.limiter.max_ops(),
                    window_secs: self.limiter.window_secs(),
                    retry_after_secs: decision.retry_after_secs,
                });
            }
        }

        // Confirmation is checked before a connection is consumed; the purge
        // routine re-checks it as part of its own contract.
        if let Operation::PurgeMemory(ref params) = op {
            if params.confirm != purge::CONFIRM_TOKEN {
                return Err(MemoryError::Permission(format!(
                    "purge requires confirm={:?}",
                    purge::CONFIRM_TOKEN
                )));
            }
        }

        // Health check uses its own short acquire timeout and reports
        // pool exhaustion as a status rather than an error.
        if let Operation::HealthCheck = op {
            return self.run_health_check();
        }

        let limits = &self.config.limits;
        let mut conn = self.pool.acquire()?;

        let response = match op {
            Operation::RememberDecision(params) => to_json(decisions::remember_decision(
                &mut conn,
                &params.decision,
                &params.rationale,
                params.context.as_deref(),
                params.alternatives.as_deref(),
                limits.max_decisions,
            )?),
            Operation::RecallDecisions(params) => to_json(decisions::recall_decisions(
                &conn,
                params.keyword.as_deref(),
                params.limit,
            )?),
            Operation::StorePattern(params) => to_json(patterns::store_pattern(
                &mut conn,
                &params.name,
                &params.description,
                params.example.as_deref(),
                params.when_to_use.as_deref(),
                limits.max_patterns,
            )?),
            Operation::GetPatterns => to_json(patterns::get_patterns(&conn)?),
            Operation::SetContext(params) => to_json(context::set_context(
                &mut conn,
                &params.key,
                &params.value,
                limits.max_context_keys,
            )?),
            Operation::GetContext => to_json(context::get_context(&conn)?),
            Operation::MemoryStats => {
                let memory = stats::memory_stats(&conn, limits, Some(&self.db_path))?;
                to_json(ServiceStats {
                    memory,
                    pool: self.pool.status(),
                    rate_limit: self.limiter.snapshot(),
                })
            }
            Operation::ExportMemory => {
                to_json(export::export_memory(&mut conn, limits, Some(&self.db_path))?)
            }
            Operation::ImportMemory(params) => {
                let blob = export::parse_blob(&params.data)?;
                to_json(export::import_memory(&mut conn, blob, limits)?)
            }
            Operation::PurgeMemory(params) => {
                to_json(purge::purge_memory(&mut conn, &params.confirm)?)
            }
            Operation::HealthCheck => unreachable!("handled above"),
        };

        response
    }

    fn run_health_check(&self) -> Result<Value> {
        let report = match self.pool.acquire_within(HEALTH_ACQUIRE_TIMEOUT) {
            Ok(mut conn) => health::health_check(
                &mut conn,
                &self.config.limits,
                self.config.storage.read_only,
            )?,
            Err(MemoryError::PoolExhausted { waited_ms }) => {
                HealthReport::connection_failed(&format!(
                    "no pooled connection within {waited_ms}ms"
                ))
            }
            Err(e) => return Err(e),
        };
        to_json(report)
    }

    /// Explicit teardown: sweep limiter persistence and release the pool.
    pub fn shutdown(&self) {
        self.limiter.flush();
        tracing::info!("service context shut down");
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|e| MemoryError::Internal(format!("response serialization failed: {e}")))
}

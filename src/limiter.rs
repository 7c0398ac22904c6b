//! Sliding-window rate limiting, independent of the connection pool.
//!
//! The window is a deque of operation timestamps pruned on every call, so the
//! limit trails continuously rather than resetting on calendar boundaries.
//! Denied calls are not recorded. With persistence enabled, timestamps are
//! mirrored to the `rate_limit_ops` table so the window survives restarts; a
//! persistence failure degrades to in-memory operation with a warning rather
//! than blocking the caller.

use rusqlite::{params, Connection};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use crate::config::RateLimitConfig;

/// How often persisted timestamps are swept from the database.
const CLEANUP_INTERVAL_MS: i64 = 5 * 60 * 1000;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Operations left in the current window (after this one, if allowed).
    pub remaining: usize,
    pub utilization_percent: f64,
    /// Seconds until the oldest recorded operation leaves the window.
    /// Zero when allowed.
    pub retry_after_secs: u64,
}

/// Point-in-time window usage, reported by stats and health checks.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LimiterSnapshot {
    pub used: usize,
    pub max_ops: usize,
    pub remaining: usize,
    pub utilization_percent: f64,
}

struct Persistence {
    conn: Mutex<Connection>,
    last_cleanup_ms: Mutex<i64>,
}

pub struct RateLimiter {
    max_ops: usize,
    window_ms: i64,
    ops: Mutex<VecDeque<i64>>,
    persistence: Option<Persistence>,
}

impl RateLimiter {
    /// In-memory limiter; the window resets on process restart.
    pub fn in_memory(max_ops: usize, window_secs: u64) -> Self {
        Self {
            max_ops,
            window_ms: window_secs as i64 * 1000,
            ops: Mutex::new(VecDeque::new()),
            persistence: None,
        }
    }

    /// Limiter with its window persisted in the given database.
    ///
    /// Falls back to in-memory operation if the persistence table cannot be
    /// opened, so the service can always start.
    pub fn persistent(
        db_path: &Path,
        max_ops: usize,
        window_secs: u64,
    ) -> Self {
        match Connection::open(db_path) {
            Ok(conn) => {
                let _ = conn.busy_timeout(std::time::Duration::from_secs(5));
                let mut limiter = Self {
                    max_ops,
                    window_ms: window_secs as i64 * 1000,
                    ops: Mutex::new(VecDeque::new()),
                    persistence: Some(Persistence {
                        conn: Mutex::new(conn),
                        last_cleanup_ms: Mutex::new(now_ms()),
                    }),
                };
                limiter.load_persisted();
                limiter
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to open rate-limit persistence; falling back to in-memory window"
                );
                Self::in_memory(max_ops, window_secs)
            }
        }
    }

    /// Build from configuration, choosing persistence per the `persist` flag.
    pub fn from_config(config: &RateLimitConfig, db_path: &Path) -> Self {
        if config.persist {
            Self::persistent(db_path, config.ops_per_minute, config.window_secs)
        } else {
            Self::in_memory(config.ops_per_minute, config.window_secs)
        }
    }

    /// Check whether `cost` more operations fit in the current window, and
    /// record them if so.
    pub fn allow(&self, cost: usize) -> RateLimitDecision {
        let decision = self.allow_at(now_ms(), cost);
        if decision.allowed {
            self.persist_latest(cost);
        }
        decision
    }

    /// Window check against an explicit clock. Factored out so tests can
    /// drive time without sleeping.
    fn allow_at(&self, now_ms: i64, cost: usize) -> RateLimitDecision {
        let cutoff = now_ms - self.window_ms;
        let mut ops = self.ops.lock().expect("limiter lock poisoned");

        while ops.front().is_some_and(|&t| t < cutoff) {
            ops.pop_front();
        }

        if ops.len() + cost > self.max_ops {
            let retry_after_ms = ops
                .front()
                .map(|&oldest| (oldest + self.window_ms - now_ms).max(0))
                .unwrap_or(0);
            return RateLimitDecision {
                allowed: false,
                remaining: self.max_ops.saturating_sub(ops.len()),
                utilization_percent: percent(ops.len(), self.max_ops),
                retry_after_secs: (retry_after_ms as u64).div_ceil(1000),
            };
        }

        for _ in 0..cost {
            ops.push_back(now_ms);
        }

        RateLimitDecision {
            allowed: true,
            remaining: self.max_ops - ops.len(),
            utilization_percent: percent(ops.len(), self.max_ops),
            retry_after_secs: 0,
        }
    }

    /// Current window usage without recording anything.
    pub fn snapshot(&self) -> LimiterSnapshot {
        let cutoff = now_ms() - self.window_ms;
        let mut ops = self.ops.lock().expect("limiter lock poisoned");
        while ops.front().is_some_and(|&t| t < cutoff) {
            ops.pop_front();
        }
        LimiterSnapshot {
            used: ops.len(),
            max_ops: self.max_ops,
            remaining: self.max_ops.saturating_sub(ops.len()),
            utilization_percent: percent(ops.len(), self.max_ops),
        }
    }

    pub fn max_ops(&self) -> usize {
        self.max_ops
    }

    pub fn window_secs(&self) -> u64 {
        (self.window_ms / 1000) as u64
    }

    /// Sweep expired persisted timestamps. Called at teardown and on the
    /// periodic cleanup cadence.
    pub fn flush(&self) {
        let Some(ref persistence) = self.persistence else {
            return;
        };
        let cutoff = now_ms() - self.window_ms;
        let conn = persistence.conn.lock().expect("limiter db lock poisoned");
        if let Err(e) = conn.execute(
            "DELETE FROM rate_limit_ops WHERE recorded_at < ?1",
            params![cutoff],
        ) {
            tracing::warn!(error = %e, "failed to sweep persisted rate-limit window");
        }
    }

    fn load_persisted(&mut self) {
        let Some(ref persistence) = self.persistence else {
            return;
        };
        let cutoff = now_ms() - self.window_ms;
        let conn = persistence.conn.lock().expect("limiter db lock poisoned");

        let loaded: rusqlite::Result<Vec<i64>> = conn
            .prepare(
                "SELECT recorded_at FROM rate_limit_ops
                 WHERE recorded_at >= ?1 ORDER BY recorded_at",
            )
            .and_then(|mut stmt| {
                stmt.query_map(params![cutoff], |row| row.get(0))?
                    .collect()
            });

        match loaded {
            Ok(timestamps) => {
                let count = timestamps.len();
                *self.ops.lock().expect("limiter lock poisoned") = timestamps.into();
                tracing::info!(count, "restored rate-limit window from persistence");
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted rate-limit window");
            }
        }
    }

    fn persist_latest(&self, cost: usize) {
        let Some(ref persistence) = self.persistence else {
            return;
        };
        let now = now_ms();
        let conn = persistence.conn.lock().expect("limiter db lock poisoned");
        for _ in 0..cost {
            if let Err(e) = conn.execute(
                "INSERT INTO rate_limit_ops (recorded_at) VALUES (?1)",
                params![now],
            ) {
                tracing::warn!(error = %e, "failed to persist rate-limit operation");
                return;
            }
        }
        drop(conn);

        let mut last_cleanup = persistence
            .last_cleanup_ms
            .lock()
            .expect("limiter cleanup lock poisoned");
        if now - *last_cleanup >= CLEANUP_INTERVAL_MS {
            *last_cleanup = now;
            drop(last_cleanup);
            self.flush();
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn percent(used: usize, max: usize) -> f64 {
    if max == 0 {
        return 100.0;
    }
    (used as f64 / max as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_denies() {
        let limiter = RateLimiter::in_memory(3, 60);
        let t0 = 1_000_000;

        for i in 0..3 {
            let d = limiter.allow_at(t0 + i, 1);
            assert!(d.allowed, "op {i} should be allowed");
        }

        let denied = limiter.allow_at(t0 + 10, 1);
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.utilization_percent, 100.0);
        assert!(denied.retry_after_secs > 0);
    }

    #[test]
    fn window_expiry_readmits() {
        let limiter = RateLimiter::in_memory(2, 60);
        let t0 = 1_000_000;

        assert!(limiter.allow_at(t0, 1).allowed);
        assert!(limiter.allow_at(t0 + 1, 1).allowed);
        assert!(!limiter.allow_at(t0 + 2, 1).allowed);

        // Just past the 60s window: both slots free again
        let later = t0 + 60_001;
        let d = limiter.allow_at(later, 1);
        assert!(d.allowed);
        assert_eq!(d.remaining, 1);
    }

    #[test]
    fn denied_calls_are_not_recorded() {
        let limiter = RateLimiter::in_memory(1, 60);
        let t0 = 1_000_000;

        assert!(limiter.allow_at(t0, 1).allowed);
        for i in 0..10 {
            assert!(!limiter.allow_at(t0 + i, 1).allowed);
        }
        // The single recorded op expires; denials must not have extended it.
        assert!(limiter.allow_at(t0 + 60_001, 1).allowed);
    }

    #[test]
    fn cost_counts_multiple_slots() {
        let limiter = RateLimiter::in_memory(5, 60);
        let t0 = 1_000_000;

        let d = limiter.allow_at(t0, 3);
        assert!(d.allowed);
        assert_eq!(d.remaining, 2);
        assert!(!limiter.allow_at(t0 + 1, 3).allowed);
        assert!(limiter.allow_at(t0 + 2, 2).allowed);
    }

    #[test]
    fn retry_hint_tracks_oldest_op() {
        let limiter = RateLimiter::in_memory(1, 60);
        let t0 = 1_000_000;

        limiter.allow_at(t0, 1);
        let denied = limiter.allow_at(t0 + 30_000, 1);
        assert!(!denied.allowed);
        assert_eq!(denied.retry_after_secs, 30);
    }

    #[test]
    fn snapshot_reports_without_recording() {
        let limiter = RateLimiter::in_memory(4, 60);
        limiter.allow(1);

        let snap = limiter.snapshot();
        assert_eq!(snap.used, 1);
        assert_eq!(snap.remaining, 3);
        assert_eq!(snap.utilization_percent, 25.0);

        // snapshot itself consumed nothing
        assert_eq!(limiter.snapshot().used, 1);
    }

    #[test]
    fn persistent_limiter_restores_window() {
        let tmp = tempfile::TempDir::new().unwrap();
        let db_path = tmp.path().join("limits.db");
        crate::db::open_database(&db_path).unwrap();

        {
            let limiter = RateLimiter::persistent(&db_path, 10, 60);
            limiter.allow(1);
            limiter.allow(1);
        }

        // New instance sees the persisted window
        let limiter = RateLimiter::persistent(&db_path, 10, 60);
        assert_eq!(limiter.snapshot().used, 2);
    }

    #[test]
    fn persistent_falls_back_when_path_unusable() {
        let limiter =
            RateLimiter::persistent(Path::new("/nonexistent/dir/limits.db"), 5, 60);
        // Still functions as an in-memory limiter
        assert!(limiter.allow(1).allowed);
    }
}

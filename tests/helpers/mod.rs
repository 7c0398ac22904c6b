#![allow(dead_code)]

use serde_json::Value;
use tabula::config::{LimitsConfig, PoolConfig, RateLimitConfig, TabulaConfig};
use tabula::protocol::Operation;
use tabula::service::ServiceContext;
use tempfile::TempDir;

/// Config pointing at a fresh database inside `tmp`, with small limits so
/// capacity behavior is easy to exercise.
pub fn test_config(tmp: &TempDir) -> TabulaConfig {
    let mut config = TabulaConfig::default();
    config.storage.db_path = tmp
        .path()
        .join("memory.db")
        .to_string_lossy()
        .into_owned();
    config.limits = LimitsConfig {
        max_decisions: 3,
        max_patterns: 2,
        max_context_keys: 2,
    };
    config.pool = PoolConfig {
        size: 2,
        acquire_timeout_secs: 1,
    };
    config.rate_limit = RateLimitConfig {
        ops_per_minute: 1000,
        window_secs: 60,
        persist: false,
    };
    config
}

/// Service context over a fresh temp database.
pub fn test_service(tmp: &TempDir) -> ServiceContext {
    ServiceContext::new(test_config(tmp)).unwrap()
}

/// Parse a wire-level request; panics on invalid shape (tests construct
/// valid requests unless they are specifically testing rejection).
pub fn op(name: &str, args: Value) -> Operation {
    Operation::from_request(name, args).unwrap()
}

/// Shorthand for remembering a decision through the full dispatch path.
pub fn remember(ctx: &ServiceContext, decision: &str) -> Value {
    ctx.dispatch(op(
        "remember_decision",
        serde_json::json!({"decision": decision, "rationale": "test rationale"}),
    ))
    .unwrap()
}

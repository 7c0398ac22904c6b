mod helpers;

use helpers::{op, test_config};
use serde_json::{json, Value};
use std::sync::Arc;
use tabula::service::ServiceContext;
use tempfile::TempDir;

#[test]
fn concurrent_writers_never_exceed_capacity() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.limits.max_decisions = 5;
    config.pool.size = 4;
    config.pool.acquire_timeout_secs = 10;
    let ctx = Arc::new(ServiceContext::new(config).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                for i in 0..10 {
                    ctx.dispatch(op(
                        "remember_decision",
                        json!({
                            "decision": format!("w{worker}-d{i}"),
                            "rationale": "contention test"
                        }),
                    ))
                    .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 40 writes through 4 threads; the cap must hold exactly.
    let stats = ctx.dispatch(op("memory_stats", Value::Null)).unwrap();
    assert_eq!(stats["decisions"], 5);
}

#[test]
fn concurrent_readers_share_the_pool() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.pool.size = 2;
    config.pool.acquire_timeout_secs = 10;
    let ctx = Arc::new(ServiceContext::new(config).unwrap());

    ctx.dispatch(op(
        "remember_decision",
        json!({"decision": "shared fact", "rationale": "r"}),
    ))
    .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                let recalled = ctx.dispatch(op("recall_decisions", Value::Null)).unwrap();
                assert_eq!(recalled.as_array().unwrap().len(), 1);
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // All connections back in the pool afterwards.
    let stats = ctx.dispatch(op("memory_stats", Value::Null)).unwrap();
    assert_eq!(stats["pool"]["in_use"], 1); // the one running this stats call
}

#[test]
fn rate_limit_window_survives_restart_when_persisted() {
    let tmp = TempDir::new().unwrap();
    let mut config = test_config(&tmp);
    config.rate_limit.persist = true;

    {
        let ctx = ServiceContext::new(config.clone()).unwrap();
        for _ in 0..4 {
            ctx.dispatch(op("get_context", Value::Null)).unwrap();
        }
        ctx.shutdown();
    }

    // A fresh context over the same database restores the window.
    let ctx = ServiceContext::new(config).unwrap();
    let stats = ctx.dispatch(op("memory_stats", Value::Null)).unwrap();
    assert!(
        stats["rate_limit"]["used"].as_u64().unwrap() >= 4,
        "persisted window should carry over, got {}",
        stats["rate_limit"]["used"]
    );
}

mod helpers;

use helpers::{op, remember, test_service};
use serde_json::{json, Value};
use tabula::error::MemoryError;
use tempfile::TempDir;

fn export_json(ctx: &tabula::service::ServiceContext) -> String {
    ctx.dispatch(op("export_memory", Value::Null))
        .unwrap()
        .to_string()
}

#[test]
fn round_trip_reproduces_stats() {
    let tmp = TempDir::new().unwrap();
    let ctx = test_service(&tmp);

    remember(&ctx, "keep me");
    ctx.dispatch(op(
        "store_pattern",
        json!({"name": "p", "description": "d"}),
    ))
    .unwrap();
    ctx.dispatch(op("set_context", json!({"key": "k", "value": "v"})))
        .unwrap();

    let blob = export_json(&ctx);
    let before = ctx.dispatch(op("memory_stats", Value::Null)).unwrap();

    let fresh_tmp = TempDir::new().unwrap();
    let fresh = test_service(&fresh_tmp);
    let result = fresh
        .dispatch(op("import_memory", json!({"data": blob})))
        .unwrap();
    assert_eq!(result["decisions_imported"], 1);
    assert_eq!(result["patterns_imported"], 1);
    assert_eq!(result["context_imported"], 1);

    let after = fresh.dispatch(op("memory_stats", Value::Null)).unwrap();
    for field in ["decisions", "patterns", "context_keys"] {
        assert_eq!(before[field], after[field], "{field} should round-trip");
    }
}

#[test]
fn import_fully_replaces_previous_state() {
    let tmp = TempDir::new().unwrap();
    let ctx = test_service(&tmp);
    remember(&ctx, "only survivor");
    let blob = export_json(&ctx);

    let target_tmp = TempDir::new().unwrap();
    let target = test_service(&target_tmp);
    remember(&target, "will vanish");
    target
        .dispatch(op("set_context", json!({"key": "stale", "value": "x"})))
        .unwrap();

    target
        .dispatch(op("import_memory", json!({"data": blob})))
        .unwrap();

    let recalled = target.dispatch(op("recall_decisions", Value::Null)).unwrap();
    let texts: Vec<&str> = recalled
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["decision"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["only survivor"]);

    let context = target.dispatch(op("get_context", Value::Null)).unwrap();
    assert!(context.as_object().unwrap().is_empty());
}

#[test]
fn version_mismatch_is_a_schema_error() {
    let tmp = TempDir::new().unwrap();
    let ctx = test_service(&tmp);

    let mut blob: Value = serde_json::from_str(&export_json(&ctx)).unwrap();
    blob["format_version"] = json!(99);

    let err = ctx
        .dispatch(op("import_memory", json!({"data": blob.to_string()})))
        .unwrap_err();
    assert!(matches!(err, MemoryError::SchemaVersion { found: 99, .. }));
}

#[test]
fn tampered_export_cannot_bypass_key_rules() {
    let tmp = TempDir::new().unwrap();
    let ctx = test_service(&tmp);
    ctx.dispatch(op(
        "store_pattern",
        json!({"name": "legit", "description": "d"}),
    ))
    .unwrap();

    let mut blob: Value = serde_json::from_str(&export_json(&ctx)).unwrap();
    blob["patterns"][0]["name"] = json!("../../etc/passwd");

    let err = ctx
        .dispatch(op("import_memory", json!({"data": blob.to_string()})))
        .unwrap_err();
    assert!(matches!(err, MemoryError::Validation(_)));

    // Original state untouched by the failed import.
    let patterns = ctx.dispatch(op("get_patterns", Value::Null)).unwrap();
    assert_eq!(patterns[0]["name"], "legit");
}

#[test]
fn garbage_payload_is_a_validation_error() {
    let tmp = TempDir::new().unwrap();
    let ctx = test_service(&tmp);

    let err = ctx
        .dispatch(op("import_memory", json!({"data": "]:[ not json"})))
        .unwrap_err();
    assert!(matches!(err, MemoryError::Validation(_)));
}

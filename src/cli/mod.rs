//! Terminal commands. Each one builds the same [`crate::service::ServiceContext`]
//! the MCP server uses and issues the same protocol operations — the CLI has
//! no privileged path into the store.

pub mod doctor;
pub mod export;
pub mod import;
pub mod purge;
pub mod recall;
pub mod stats;

use anyhow::Result;
use serde_json::Value;

use crate::config::TabulaConfig;
use crate::protocol::Operation;
use crate::service::ServiceContext;

/// Build a context, dispatch one operation, and tear down.
pub(crate) fn run_operation(config: TabulaConfig, op: Operation) -> Result<Value> {
    let ctx = ServiceContext::new(config)?;
    let result = ctx.dispatch(op);
    ctx.shutdown();
    Ok(result?)
}

/// Issue any protocol operation by wire name with raw JSON arguments.
/// Unknown names and malformed argument shapes are rejected the same way
/// they would be for an MCP client.
pub fn call(config: TabulaConfig, name: &str, args: Option<&str>) -> Result<()> {
    let args: Value = match args {
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| anyhow::anyhow!("arguments must be valid JSON: {e}"))?,
        None => Value::Null,
    };

    let op = Operation::from_request(name, args)?;
    let result = run_operation(config, op)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

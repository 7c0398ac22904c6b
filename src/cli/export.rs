use anyhow::Result;

use crate::config::TabulaConfig;
use crate::protocol::Operation;

/// Export the full store as JSON to stdout.
pub fn export(config: TabulaConfig) -> Result<()> {
    let blob = super::run_operation(config, Operation::ExportMemory)?;

    let json = serde_json::to_string_pretty(&blob)?;
    println!("{json}");

    eprintln!(
        "Exported {} decisions, {} patterns, {} context keys.",
        blob["decisions"].as_array().map_or(0, |a| a.len()),
        blob["patterns"].as_array().map_or(0, |a| a.len()),
        blob["context"].as_object().map_or(0, |o| o.len()),
    );

    Ok(())
}

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::TabulaConfig;
use crate::protocol::Operation;
use crate::tools::import_memory::ImportMemoryParams;

/// Import a previously exported snapshot, replacing all current memory.
pub fn import(config: TabulaConfig, file: &Path) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let result = super::run_operation(
        config,
        Operation::ImportMemory(ImportMemoryParams { data }),
    )?;

    println!("Import complete (full replace):");
    println!("  Decisions imported:    {}", result["decisions_imported"]);
    println!("  Patterns imported:     {}", result["patterns_imported"]);
    println!("  Context keys imported: {}", result["context_imported"]);
    if result["decisions_dropped"].as_u64().unwrap_or(0) > 0 {
        println!(
            "  Decisions dropped:     {} (blob exceeded max_decisions; newest kept)",
            result["decisions_dropped"]
        );
    }

    Ok(())
}

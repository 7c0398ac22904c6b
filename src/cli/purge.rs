//! CLI `purge` command — wipe all memory after explicit confirmation.

use anyhow::Result;

use crate::config::TabulaConfig;
use crate::memory::purge::CONFIRM_TOKEN;
use crate::protocol::Operation;
use crate::tools::purge_memory::PurgeMemoryParams;

/// Delete all stored memory. The exact confirmation token must be supplied
/// on the command line; there is no interactive fallback, so scripted misuse
/// fails loudly instead of deleting data.
pub fn purge(config: TabulaConfig, confirm: Option<String>) -> Result<()> {
    let Some(confirm) = confirm else {
        println!("WARNING: this permanently deletes ALL decisions, patterns, and context.");
        println!("Database: {}", config.resolved_db_path().display());
        println!();
        println!("To proceed, rerun with: tabula purge --confirm {CONFIRM_TOKEN}");
        return Ok(());
    };

    let result = super::run_operation(
        config,
        Operation::PurgeMemory(PurgeMemoryParams { confirm }),
    )?;

    println!("Memory purged:");
    println!("  Decisions deleted:    {}", result["decisions_deleted"]);
    println!("  Patterns deleted:     {}", result["patterns_deleted"]);
    println!("  Context keys deleted: {}", result["context_deleted"]);

    Ok(())
}

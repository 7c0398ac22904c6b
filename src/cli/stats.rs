use anyhow::Result;

use crate::config::TabulaConfig;
use crate::protocol::Operation;

/// Display memory statistics in the terminal.
pub fn stats(config: TabulaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let response = super::run_operation(config, Operation::MemoryStats)?;

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!(
        "  Decisions:       {} / {}",
        response["decisions"], response["limits"]["max_decisions"]
    );
    println!(
        "  Patterns:        {} / {}",
        response["patterns"], response["limits"]["max_patterns"]
    );
    println!(
        "  Context keys:    {} / {}",
        response["context_keys"], response["limits"]["max_context_keys"]
    );
    println!();
    println!(
        "  Database size:   {} bytes",
        response["db_size_bytes"]
    );
    println!("  Database path:   {}", db_path.display());
    println!();
    println!(
        "  Pool:            {} idle of {}",
        response["pool"]["idle"], response["pool"]["size"]
    );
    println!(
        "  Rate limit:      {} used of {} per window",
        response["rate_limit"]["used"], response["rate_limit"]["max_ops"]
    );

    Ok(())
}

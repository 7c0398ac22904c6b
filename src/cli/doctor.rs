//! CLI `doctor` command — run health checks and print a diagnostic report.

use anyhow::Result;

use crate::config::TabulaConfig;
use crate::protocol::Operation;
use crate::service::ServiceContext;

/// Run service diagnostics and print a health report.
pub fn doctor(config: TabulaConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `tabula serve` or any write operation to initialize.");
        return Ok(());
    }

    let ctx = ServiceContext::new(config)?;
    let health = ctx.dispatch(Operation::HealthCheck)?;
    let stats = ctx.dispatch(Operation::MemoryStats)?;
    ctx.shutdown();

    let status = health["status"].as_str().unwrap_or("unknown");

    println!("tabula Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("Status:            {}", status.to_uppercase());
    println!();
    println!("Checks:");
    println!("  Connection:      {}", health["checks"]["connection"]);
    println!("  Integrity:       {}", health["checks"]["integrity"]);
    println!("  Write probe:     {}", health["checks"]["write_capability"]);
    println!();
    println!("Capacity:");
    println!(
        "  Decisions:       {} / {} ({}%)",
        stats["decisions"],
        stats["limits"]["max_decisions"],
        stats["utilization_percent"]["decisions"]
    );
    println!(
        "  Patterns:        {} / {} ({}%)",
        stats["patterns"],
        stats["limits"]["max_patterns"],
        stats["utilization_percent"]["patterns"]
    );
    println!(
        "  Context keys:    {} / {} ({}%)",
        stats["context_keys"],
        stats["limits"]["max_context_keys"],
        stats["utilization_percent"]["context"]
    );

    if status != "healthy" {
        println!();
        println!("Recovery steps:");
        println!("  1. Back up what is readable: tabula export > backup.json");
        println!("  2. Remove or restore the database file, then reimport:");
        println!("     tabula import backup.json");
    }

    Ok(())
}

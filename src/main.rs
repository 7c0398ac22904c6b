mod cli;
mod config;
mod db;
mod error;
mod limiter;
mod memory;
mod protocol;
mod server;
mod service;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tabula", version, about = "Project memory MCP server for AI coding agents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport)
    Serve,
    /// Show memory statistics
    Stats,
    /// Search past decisions, newest first
    Recall {
        /// Keyword to filter by (matches decision, rationale, context)
        keyword: Option<String>,
        /// Maximum number of results (1-100)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export all memory as JSON to stdout
    Export,
    /// Import a previously exported snapshot (replaces all current memory)
    Import {
        /// Path to the JSON export file
        file: PathBuf,
    },
    /// Run health diagnostics
    Doctor,
    /// Issue a raw protocol operation by name, with JSON arguments
    Call {
        /// Operation name, e.g. remember_decision
        operation: String,
        /// Arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
    /// Delete ALL stored memory (requires --confirm CONFIRM_PURGE)
    Purge {
        /// Confirmation token; must be exactly CONFIRM_PURGE
        #[arg(long)]
        confirm: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::TabulaConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for MCP JSON-RPC and exports.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve_stdio(config).await?,
        Command::Stats => cli::stats::stats(config)?,
        Command::Recall { keyword, limit } => cli::recall::recall(config, keyword, limit)?,
        Command::Export => cli::export::export(config)?,
        Command::Import { file } => cli::import::import(config, &file)?,
        Command::Doctor => cli::doctor::doctor(config)?,
        Command::Call { operation, args } => cli::call(config, &operation, args.as_deref())?,
        Command::Purge { confirm } => cli::purge::purge(config, confirm)?,
    }

    Ok(())
}

//! MCP server initialization for the stdio transport.
//!
//! Wires the service context into the MCP tool handler and runs it over
//! stdio. Teardown is explicit: when the client disconnects, the context's
//! shutdown hook flushes limiter state before the process exits.

use crate::config::TabulaConfig;
use crate::service::ServiceContext;
use crate::tools::TabulaTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: TabulaConfig) -> Result<()> {
    tracing::info!("starting tabula MCP server on stdio");

    let ctx = Arc::new(ServiceContext::new(config)?);

    let tools = TabulaTools::new(Arc::clone(&ctx));
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;

    ctx.shutdown();
    tracing::info!("MCP server shut down");

    Ok(())
}

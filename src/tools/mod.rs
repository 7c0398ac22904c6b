pub mod import_memory;
pub mod purge_memory;
pub mod recall_decisions;
pub mod remember_decision;
pub mod set_context;
pub mod store_pattern;

use import_memory::ImportMemoryParams;
use purge_memory::PurgeMemoryParams;
use recall_decisions::RecallDecisionsParams;
use remember_decision::RememberDecisionParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use set_context::SetContextParams;
use std::sync::Arc;
use store_pattern::StorePatternParams;

use crate::protocol::{self, Operation};
use crate::service::ServiceContext;

/// The tabula MCP tool handler. Holds the shared service context and exposes
/// all operations as MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct TabulaTools {
    tool_router: ToolRouter<Self>,
    ctx: Arc<ServiceContext>,
}

impl TabulaTools {
    /// Dispatch an operation on the blocking thread pool and shape the
    /// outcome into the MCP result: JSON payload on success, structured
    /// error body (code + message + request id) on failure.
    async fn run(&self, op: Operation) -> Result<String, String> {
        let request_id = protocol::new_request_id();
        let op_name = op.kind().name();

        let ctx = Arc::clone(&self.ctx);
        let result = tokio::task::spawn_blocking(move || ctx.dispatch(op))
            .await
            .map_err(|e| format!("dispatch task failed: {e}"))?;

        match result {
            Ok(value) => {
                tracing::debug!(op = op_name, request_id = %request_id, "operation ok");
                serde_json::to_string(&value).map_err(|e| format!("serialization failed: {e}"))
            }
            Err(err) => {
                tracing::warn!(
                    op = op_name,
                    request_id = %request_id,
                    code = err.code(),
                    error = %err,
                    "operation failed"
                );
                Err(protocol::error_body(&err, &request_id).to_string())
            }
        }
    }
}

#[tool_router]
impl TabulaTools {
    pub fn new(ctx: Arc<ServiceContext>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            ctx,
        }
    }

    #[tool(description = "Store a decision and its rationale for future sessions. Use this to preserve important architectural choices, trade-offs, and reasoning.")]
    async fn remember_decision(
        &self,
        Parameters(params): Parameters<RememberDecisionParams>,
    ) -> Result<String, String> {
        self.run(Operation::RememberDecision(params)).await
    }

    #[tool(description = "Retrieve past decisions, newest first, optionally filtered by keyword. Useful for understanding why things are the way they are.")]
    async fn recall_decisions(
        &self,
        Parameters(params): Parameters<RecallDecisionsParams>,
    ) -> Result<String, String> {
        self.run(Operation::RecallDecisions(params)).await
    }

    #[tool(description = "Store a named code pattern or convention for this project. Storing an existing name updates it in place.")]
    async fn store_pattern(
        &self,
        Parameters(params): Parameters<StorePatternParams>,
    ) -> Result<String, String> {
        self.run(Operation::StorePattern(params)).await
    }

    #[tool(description = "Retrieve all stored patterns for this project.")]
    async fn get_patterns(&self) -> Result<String, String> {
        self.run(Operation::GetPatterns).await
    }

    #[tool(description = "Store contextual information as a key-value pair. Keys are alphanumeric with underscores, hyphens, and dots.")]
    async fn set_context(
        &self,
        Parameters(params): Parameters<SetContextParams>,
    ) -> Result<String, String> {
        self.run(Operation::SetContext(params)).await
    }

    #[tool(description = "Retrieve all stored context key-value pairs for this project.")]
    async fn get_context(&self) -> Result<String, String> {
        self.run(Operation::GetContext).await
    }

    #[tool(description = "Get statistics about stored memory: counts, limits, utilization, pool and rate-limit state.")]
    async fn memory_stats(&self) -> Result<String, String> {
        self.run(Operation::MemoryStats).await
    }

    #[tool(description = "Export all stored memory as a versioned JSON snapshot for backup or portability.")]
    async fn export_memory(&self) -> Result<String, String> {
        self.run(Operation::ExportMemory).await
    }

    #[tool(description = "Import a previously exported JSON snapshot, atomically replacing all current memory.")]
    async fn import_memory(
        &self,
        Parameters(params): Parameters<ImportMemoryParams>,
    ) -> Result<String, String> {
        self.run(Operation::ImportMemory(params)).await
    }

    #[tool(description = "Check memory service health: connectivity, integrity, write capability, and capacity headroom.")]
    async fn health_check(&self) -> Result<String, String> {
        self.run(Operation::HealthCheck).await
    }

    #[tool(description = "Delete ALL stored memory. Requires confirm='CONFIRM_PURGE' exactly; anything else is rejected.")]
    async fn purge_memory(
        &self,
        Parameters(params): Parameters<PurgeMemoryParams>,
    ) -> Result<String, String> {
        self.run(Operation::PurgeMemory(params)).await
    }
}

#[tool_handler]
impl ServerHandler for TabulaTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "tabula is a persistent project memory server. Use remember_decision to \
                 record choices and their rationale, store_pattern for project conventions, \
                 set_context for key facts, and recall_decisions to search past decisions."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

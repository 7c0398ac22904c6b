//! MCP `recall_decisions` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `recall_decisions` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallDecisionsParams {
    #[schemars(
        description = "Optional keyword to filter decisions; matches decision, rationale, and context case-insensitively"
    )]
    pub keyword: Option<String>,

    #[schemars(description = "Maximum number of decisions to return (1-100, default 20)")]
    pub limit: Option<usize>,
}

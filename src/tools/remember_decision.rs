//! MCP `remember_decision` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `remember_decision` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberDecisionParams {
    #[schemars(description = "The decision made (max 10000 chars)")]
    pub decision: String,

    #[schemars(description = "Why this decision was made")]
    pub rationale: String,

    #[schemars(description = "What problem this solved or what triggered the decision")]
    pub context: Option<String>,

    #[schemars(description = "Other options that were considered")]
    pub alternatives: Option<String>,
}

//! MCP `set_context` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `set_context` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SetContextParams {
    #[schemars(
        description = "Context key (alphanumeric, underscores, hyphens, dots; max 100 chars)"
    )]
    pub key: String,

    #[schemars(description = "Context value")]
    pub value: String,
}

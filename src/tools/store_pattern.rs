//! MCP `store_pattern` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `store_pattern` MCP tool.
///
/// Storing an existing name replaces the record in place.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StorePatternParams {
    #[schemars(
        description = "Pattern name (alphanumeric, underscores, hyphens, dots; max 100 chars)"
    )]
    pub name: String,

    #[schemars(description = "What this pattern does and why it's used")]
    pub description: String,

    #[schemars(description = "Code example demonstrating the pattern")]
    pub example: Option<String>,

    #[schemars(description = "Guidelines for when to apply this pattern")]
    pub when_to_use: Option<String>,
}

//! MCP `purge_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `purge_memory` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PurgeMemoryParams {
    #[schemars(
        description = "Must be exactly 'CONFIRM_PURGE'. Anything else leaves the store untouched."
    )]
    pub confirm: String,
}

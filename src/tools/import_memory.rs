//! MCP `import_memory` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `import_memory` MCP tool.
///
/// Import atomically replaces the current store with the blob's contents.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ImportMemoryParams {
    #[schemars(description = "JSON string produced by a previous export_memory call")]
    pub data: String,
}

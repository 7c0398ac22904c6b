//! Record types for the memory tables.
//!
//! [`Decision`] rows are append-only and immutable once written; [`Pattern`]
//! records update in place. Context entries travel as plain key/value maps
//! and need no struct of their own.

use serde::{Deserialize, Serialize};

/// An immutable entry in the decision log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// Storage-assigned id; strictly increasing, never reused.
    pub id: i64,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
    /// The decision that was made.
    pub decision: String,
    /// Why it was made.
    pub rationale: String,
    /// What problem it solved or what triggered it.
    #[serde(default)]
    pub context: String,
    /// Other options that were considered.
    #[serde(default)]
    pub alternatives: String,
}

/// A named project convention. Storing an existing name replaces the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub when_to_use: String,
    /// ISO 8601 timestamp of the last insert or replace.
    pub updated_at: String,
}

//! The closed operation set and its wire mapping.
//!
//! Every externally issued request becomes an [`Operation`] variant with a
//! typed argument struct before it reaches the service, so argument shapes
//! are checked once, here, rather than in each handler. Names outside the
//! closed set fail with `UnknownOperation`; argument-shape mismatches fail
//! with `Validation`. Errors serialize to a stable structured body carrying a
//! machine code and a request id for log correlation.

use serde_json::Value;

use crate::error::{MemoryError, Result};
use crate::tools::import_memory::ImportMemoryParams;
use crate::tools::purge_memory::PurgeMemoryParams;
use crate::tools::recall_decisions::RecallDecisionsParams;
use crate::tools::remember_decision::RememberDecisionParams;
use crate::tools::set_context::SetContextParams;
use crate::tools::store_pattern::StorePatternParams;

/// A fully parsed request: operation kind plus shape-checked arguments.
#[derive(Debug)]
pub enum Operation {
    RememberDecision(RememberDecisionParams),
    RecallDecisions(RecallDecisionsParams),
    StorePattern(StorePatternParams),
    GetPatterns,
    SetContext(SetContextParams),
    GetContext,
    MemoryStats,
    ExportMemory,
    ImportMemory(ImportMemoryParams),
    HealthCheck,
    PurgeMemory(PurgeMemoryParams),
}

/// Operation kinds, independent of their arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    RememberDecision,
    RecallDecisions,
    StorePattern,
    GetPatterns,
    SetContext,
    GetContext,
    MemoryStats,
    ExportMemory,
    ImportMemory,
    HealthCheck,
    PurgeMemory,
}

impl OperationKind {
    pub const ALL: [OperationKind; 11] = [
        Self::RememberDecision,
        Self::RecallDecisions,
        Self::StorePattern,
        Self::GetPatterns,
        Self::SetContext,
        Self::GetContext,
        Self::MemoryStats,
        Self::ExportMemory,
        Self::ImportMemory,
        Self::HealthCheck,
        Self::PurgeMemory,
    ];

    /// Wire name of this operation.
    pub fn name(self) -> &'static str {
        match self {
            Self::RememberDecision => "remember_decision",
            Self::RecallDecisions => "recall_decisions",
            Self::StorePattern => "store_pattern",
            Self::GetPatterns => "get_patterns",
            Self::SetContext => "set_context",
            Self::GetContext => "get_context",
            Self::MemoryStats => "memory_stats",
            Self::ExportMemory => "export_memory",
            Self::ImportMemory => "import_memory",
            Self::HealthCheck => "health_check",
            Self::PurgeMemory => "purge_memory",
        }
    }

    /// Whether the operation mutates the store (gated in read-only mode).
    pub fn is_write(self) -> bool {
        matches!(
            self,
            Self::RememberDecision
                | Self::StorePattern
                | Self::SetContext
                | Self::ImportMemory
                | Self::PurgeMemory
        )
    }

    /// Whether the operation counts against the sliding-window rate limit.
    ///
    /// Monitoring and administrative operations are exempt: stats and health
    /// must stay observable under load, and export/import/purge are
    /// infrequent bulk actions that would burn the window unfairly.
    pub fn rate_limited(self) -> bool {
        !matches!(
            self,
            Self::MemoryStats
                | Self::ExportMemory
                | Self::ImportMemory
                | Self::HealthCheck
                | Self::PurgeMemory
        )
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::RememberDecision(_) => OperationKind::RememberDecision,
            Self::RecallDecisions(_) => OperationKind::RecallDecisions,
            Self::StorePattern(_) => OperationKind::StorePattern,
            Self::GetPatterns => OperationKind::GetPatterns,
            Self::SetContext(_) => OperationKind::SetContext,
            Self::GetContext => OperationKind::GetContext,
            Self::MemoryStats => OperationKind::MemoryStats,
            Self::ExportMemory => OperationKind::ExportMemory,
            Self::ImportMemory(_) => OperationKind::ImportMemory,
            Self::HealthCheck => OperationKind::HealthCheck,
            Self::PurgeMemory(_) => OperationKind::PurgeMemory,
        }
    }

    /// Map a wire-level request to an operation. Unknown names and malformed
    /// argument shapes are rejected here, before any resource is touched.
    pub fn from_request(name: &str, args: Value) -> Result<Self> {
        let kind = OperationKind::from_name(name)
            .ok_or_else(|| MemoryError::UnknownOperation(name.to_string()))?;

        fn parse<T: serde::de::DeserializeOwned>(
            kind: OperationKind,
            args: Value,
        ) -> Result<T> {
            serde_json::from_value(args).map_err(|e| {
                MemoryError::Validation(format!(
                    "invalid arguments for {}: {e}",
                    kind.name()
                ))
            })
        }

        Ok(match kind {
            OperationKind::RememberDecision => Self::RememberDecision(parse(kind, args)?),
            OperationKind::RecallDecisions => Self::RecallDecisions(parse(kind, args)?),
            OperationKind::StorePattern => Self::StorePattern(parse(kind, args)?),
            OperationKind::GetPatterns => Self::GetPatterns,
            OperationKind::SetContext => Self::SetContext(parse(kind, args)?),
            OperationKind::GetContext => Self::GetContext,
            OperationKind::MemoryStats => Self::MemoryStats,
            OperationKind::ExportMemory => Self::ExportMemory,
            OperationKind::ImportMemory => Self::ImportMemory(parse(kind, args)?),
            OperationKind::HealthCheck => Self::HealthCheck,
            OperationKind::PurgeMemory => Self::PurgeMemory(parse(kind, args)?),
        })
    }
}

/// Short id attached to each request for log correlation.
pub fn new_request_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()[..8].to_string()
}

/// Structured error body returned for every failure.
pub fn error_body(err: &MemoryError, request_id: &str) -> Value {
    serde_json::json!({
        "error": err.code(),
        "message": err.to_string(),
        "request_id": request_id,
        "retryable": err.retryable(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_round_trips_through_its_name() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = Operation::from_request("drop_tables", Value::Null).unwrap_err();
        assert!(matches!(err, MemoryError::UnknownOperation(_)));
    }

    #[test]
    fn malformed_args_are_a_validation_error() {
        let err = Operation::from_request(
            "remember_decision",
            serde_json::json!({"decision": 42}),
        )
        .unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
    }

    #[test]
    fn well_formed_request_parses() {
        let op = Operation::from_request(
            "store_pattern",
            serde_json::json!({"name": "errors", "description": "use thiserror"}),
        )
        .unwrap();
        assert_eq!(op.kind(), OperationKind::StorePattern);
        assert!(op.kind().is_write());
    }

    #[test]
    fn write_and_rate_limit_classification() {
        use OperationKind::*;
        for kind in [RememberDecision, StorePattern, SetContext, ImportMemory, PurgeMemory] {
            assert!(kind.is_write(), "{} should be a write", kind.name());
        }
        for kind in [RecallDecisions, GetPatterns, GetContext, MemoryStats, ExportMemory, HealthCheck] {
            assert!(!kind.is_write(), "{} should be a read", kind.name());
        }
        for kind in [MemoryStats, ExportMemory, ImportMemory, HealthCheck, PurgeMemory] {
            assert!(!kind.rate_limited(), "{} should be exempt", kind.name());
        }
        for kind in [RememberDecision, RecallDecisions, StorePattern, GetPatterns, SetContext, GetContext] {
            assert!(kind.rate_limited(), "{} should be limited", kind.name());
        }
    }

    #[test]
    fn error_body_carries_code_and_id() {
        let err = MemoryError::UnknownOperation("zap".into());
        let body = error_body(&err, "abc12345");
        assert_eq!(body["error"], "UNKNOWN_OPERATION");
        assert_eq!(body["request_id"], "abc12345");
        assert_eq!(body["retryable"], false);
    }
}

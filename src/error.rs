//! Error taxonomy for the memory service.
//!
//! Every externally visible failure maps to one variant here, so callers can
//! tell a validation problem (fix the input) from a capacity rejection (purge
//! or pick another key) from transient contention (retry with backoff).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// Malformed, oversized, or illegally-charactered input. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A new keyed record would exceed a configured maximum.
    #[error("{table} capacity exceeded: limit is {limit}")]
    CapacityExceeded { table: &'static str, limit: usize },

    /// Sliding-window quota exhausted. Carries a back-off hint.
    #[error("rate limit exceeded: {limit} ops per {window_secs}s window, retry in ~{retry_after_secs}s")]
    RateLimitExceeded {
        limit: usize,
        window_secs: u64,
        retry_after_secs: u64,
    },

    /// No pooled connection became free within the acquire timeout.
    /// Transient; safe to retry.
    #[error("connection pool exhausted: no connection free within {waited_ms}ms")]
    PoolExhausted { waited_ms: u64 },

    /// The backing store failed an integrity check or is unreadable.
    /// Fatal until an operator reinitializes or restores from an export.
    #[error("storage integrity failure: {0}")]
    StorageIntegrity(String),

    /// Read-only mode violation or missing/incorrect purge confirmation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Import blob version does not match the current export format.
    #[error("unsupported export format version {found} (this build reads version {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    /// Operation name not in the protocol's closed set.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Underlying SQLite failure not covered by a more specific kind.
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// Unexpected internal failure (e.g. response serialization).
    #[error("internal error: {0}")]
    Internal(String),
}

impl MemoryError {
    /// Stable machine-readable code, used in structured error responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::PoolExhausted { .. } => "POOL_EXHAUSTED",
            Self::StorageIntegrity(_) => "STORAGE_INTEGRITY_ERROR",
            Self::Permission(_) => "PERMISSION_ERROR",
            Self::SchemaVersion { .. } => "SCHEMA_VERSION_ERROR",
            Self::UnknownOperation(_) => "UNKNOWN_OPERATION",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may reasonably retry the same request unchanged.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::PoolExhausted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MemoryError>;

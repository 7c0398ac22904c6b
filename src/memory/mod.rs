pub mod capacity;
pub mod context;
pub mod decisions;
pub mod export;
pub mod health;
pub mod patterns;
pub mod purge;
pub mod stats;
pub mod types;
pub mod validate;

/// Current wall-clock time as an ISO 8601 string, the timestamp format used
/// throughout the store.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

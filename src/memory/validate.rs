//! Input validation and sanitization.
//!
//! The only path by which untrusted text reaches storage. Free text is
//! null-stripped, trimmed, and truncated; keys must match a strict character
//! set. Anything that fails here is reported as a validation error and never
//! touches the database.

use crate::error::{MemoryError, Result};

/// Maximum length for any free-text field, in characters.
pub const MAX_TEXT_LEN: usize = 10_000;

/// Maximum length for keys (pattern names, context keys).
pub const MAX_KEY_LEN: usize = 100;

/// Maximum length for a recall keyword.
pub const MAX_KEYWORD_LEN: usize = 100;

/// Marker appended when a value is truncated to its length cap.
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Sanitize a free-text value: strip null bytes, trim surrounding whitespace,
/// and truncate to `max_len` characters with a visible marker.
///
/// Truncation and stripping are the only silent corrections the service
/// makes; everything else is rejected outright.
pub fn sanitize_text(value: &str, max_len: usize) -> String {
    let cleaned: String = value.chars().filter(|&c| c != '\0').collect();
    let cleaned = cleaned.trim();

    if cleaned.chars().count() > max_len {
        let truncated: String = cleaned.chars().take(max_len).collect();
        format!("{truncated}{TRUNCATION_MARKER}")
    } else {
        cleaned.to_string()
    }
}

/// Whether `key` is safe for use as a pattern name or context key:
/// alphanumeric plus `_`, `-`, `.`, between 1 and 100 characters.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// Validate a key, producing a descriptive error on failure.
pub fn validate_key(key: &str) -> Result<()> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(MemoryError::Validation(format!(
            "invalid key {key:?}: keys must be 1-{MAX_KEY_LEN} characters of [A-Za-z0-9_.-]"
        )))
    }
}

/// Require a non-empty value for a named field, then sanitize it.
pub fn require_text(field: &'static str, value: &str) -> Result<String> {
    let sanitized = sanitize_text(value, MAX_TEXT_LEN);
    if sanitized.is_empty() {
        return Err(MemoryError::Validation(format!(
            "{field} must be a non-empty string"
        )));
    }
    Ok(sanitized)
}

/// Escape SQL LIKE wildcards so user input matches literally.
///
/// Backslash must be escaped before the wildcards. Use with `ESCAPE '\'`.
pub fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

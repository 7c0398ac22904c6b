//! Named pattern records: insert-or-replace and listing.

use rusqlite::{params, Connection, TransactionBehavior};
use serde::Serialize;

use crate::error::Result;
use crate::memory::capacity::{self, KeyedTable};
use crate::memory::types::Pattern;
use crate::memory::validate::{require_text, sanitize_text, validate_key, MAX_TEXT_LEN};
use crate::memory::now_rfc3339;

/// Result returned from a store-pattern operation.
#[derive(Debug, Serialize)]
pub struct StorePatternResult {
    pub name: String,
    /// `true` if an existing pattern was replaced rather than created.
    pub replaced: bool,
}

/// Insert a pattern, or replace the record in place when the name already
/// exists. Only a genuinely new name counts against the capacity limit.
pub fn store_pattern(
    conn: &mut Connection,
    name: &str,
    description: &str,
    example: Option<&str>,
    when_to_use: Option<&str>,
    max_patterns: usize,
) -> Result<StorePatternResult> {
    validate_key(name)?;
    let description = require_text("description", description)?;
    let example = sanitize_text(example.unwrap_or(""), MAX_TEXT_LEN);
    let when_to_use = sanitize_text(when_to_use.unwrap_or(""), MAX_TEXT_LEN);

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    capacity::check_keyed_capacity(&tx, KeyedTable::Patterns, name, max_patterns)?;

    let existed: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM patterns WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;

    tx.execute(
        "INSERT INTO patterns (name, description, example, when_to_use, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(name) DO UPDATE SET
             description = excluded.description,
             example = excluded.example,
             when_to_use = excluded.when_to_use,
             updated_at = excluded.updated_at",
        params![name, description, example, when_to_use, now_rfc3339()],
    )?;

    tx.commit()?;

    tracing::info!(name, replaced = existed, "pattern stored");
    Ok(StorePatternResult {
        name: name.to_string(),
        replaced: existed,
    })
}

/// All stored patterns, ordered by name.
pub fn get_patterns(conn: &Connection) -> Result<Vec<Pattern>> {
    let mut stmt = conn.prepare(
        "SELECT name, description, example, when_to_use, updated_at
         FROM patterns ORDER BY name",
    )?;
    let patterns = stmt
        .query_map([], |row| {
            Ok(Pattern {
                name: row.get(0)?,
                description: row.get(1)?,
                example: row.get(2)?,
                when_to_use: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::MemoryError;

    fn test_db() -> Connection {
        db::open_memory_database().unwrap()
    }

    #[test]
    fn store_and_list() {
        let mut conn = test_db();
        let result =
            store_pattern(&mut conn, "error-handling", "use thiserror", None, None, 10)
                .unwrap();
        assert!(!result.replaced);

        let patterns = get_patterns(&conn).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].name, "error-handling");
        assert_eq!(patterns[0].description, "use thiserror");
    }

    #[test]
    fn restore_replaces_in_place() {
        let mut conn = test_db();
        store_pattern(&mut conn, "a", "first", None, None, 10).unwrap();
        let result =
            store_pattern(&mut conn, "a", "second", Some("ex"), None, 10).unwrap();
        assert!(result.replaced);

        let patterns = get_patterns(&conn).unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].description, "second");
        assert_eq!(patterns[0].example, "ex");
    }

    #[test]
    fn new_name_rejected_at_capacity_existing_still_updates() {
        let mut conn = test_db();
        store_pattern(&mut conn, "a", "da", None, None, 2).unwrap();
        store_pattern(&mut conn, "b", "db", None, None, 2).unwrap();

        let err = store_pattern(&mut conn, "c", "dc", None, None, 2).unwrap_err();
        assert!(matches!(err, MemoryError::CapacityExceeded { .. }));

        // re-storing an existing name still succeeds
        store_pattern(&mut conn, "a", "da2", None, None, 2).unwrap();
        assert_eq!(get_patterns(&conn).unwrap().len(), 2);
    }

    #[test]
    fn invalid_name_rejected_before_storage() {
        let mut conn = test_db();
        let err = store_pattern(&mut conn, "bad name", "d", None, None, 10).unwrap_err();
        assert!(matches!(err, MemoryError::Validation(_)));
        assert!(get_patterns(&conn).unwrap().is_empty());
    }
}

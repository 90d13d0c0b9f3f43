//! `SQLite` schema definitions for interlog.
//!
//! This module contains the SQL statements for creating the interaction log.

/// SQL statement to create the interactions table.
///
/// `seq` is the acceptance sequence and the tie-breaker for equal
/// `accepted_at` values. Rows are only ever inserted.
pub const CREATE_INTERACTIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS interactions (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    user_id TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    accepted_at TEXT NOT NULL
)
";

/// SQL statement to create the acceptance-order index.
///
/// Covers `ORDER BY accepted_at, seq` in both directions, which is how every
/// recency query reads the log.
pub const CREATE_ACCEPTED_AT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_interactions_accepted_at ON interactions(accepted_at, seq)
";

/// SQL statement to create an index on `kind` for per-kind statistics.
pub const CREATE_KIND_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_interactions_kind ON interactions(kind)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_INTERACTIONS_TABLE,
    CREATE_ACCEPTED_AT_INDEX,
    CREATE_KIND_INDEX,
    CREATE_METADATA_TABLE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_statements_not_empty() {
        assert!(!SCHEMA_STATEMENTS.is_empty());
        for stmt in SCHEMA_STATEMENTS {
            assert!(!stmt.trim().is_empty());
        }
    }

    #[test]
    fn test_interactions_table_columns() {
        assert!(CREATE_INTERACTIONS_TABLE.contains("seq INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(CREATE_INTERACTIONS_TABLE.contains("id TEXT NOT NULL UNIQUE"));
        assert!(CREATE_INTERACTIONS_TABLE.contains("user_id TEXT NOT NULL"));
        assert!(CREATE_INTERACTIONS_TABLE.contains("kind TEXT NOT NULL"));
        assert!(CREATE_INTERACTIONS_TABLE.contains("payload TEXT NOT NULL"));
        assert!(CREATE_INTERACTIONS_TABLE.contains("accepted_at TEXT NOT NULL"));
    }
}

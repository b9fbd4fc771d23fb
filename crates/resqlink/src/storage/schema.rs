//! `SQLite` schema definitions for resqlink.
//!
//! Every record lives in one `documents` table keyed by (collection, id).
//! `owner_id` and `lookup_key` are projections of the JSON body kept in
//! columns so they can be indexed.

/// SQL statement to create the documents table.
pub const CREATE_DOCUMENTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    owner_id TEXT,
    lookup_key TEXT,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    PRIMARY KEY (collection, doc_id)
)
";

/// Secondary keys (account e-mail, contributor + item name) are unique per collection.
pub const CREATE_LOOKUP_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_lookup
    ON documents(collection, lookup_key) WHERE lookup_key IS NOT NULL
";

/// SQL statement to create an index on `owner_id` for per-owner listings.
pub const CREATE_OWNER_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(collection, owner_id)
";

/// SQL statement to create the ID sequence table.
pub const CREATE_SEQUENCES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS id_sequences (
    name TEXT PRIMARY KEY,
    last_value INTEGER NOT NULL
)
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
    CREATE_DOCUMENTS_TABLE,
    CREATE_LOOKUP_INDEX,
    CREATE_OWNER_INDEX,
    CREATE_SEQUENCES_TABLE,
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
    fn test_documents_table_contains_required_columns() {
        assert!(CREATE_DOCUMENTS_TABLE.contains("collection TEXT NOT NULL"));
        assert!(CREATE_DOCUMENTS_TABLE.contains("doc_id TEXT NOT NULL"));
        assert!(CREATE_DOCUMENTS_TABLE.contains("body TEXT NOT NULL"));
        assert!(CREATE_DOCUMENTS_TABLE.contains("PRIMARY KEY (collection, doc_id)"));
    }

    #[test]
    fn test_lookup_index_is_unique() {
        assert!(CREATE_LOOKUP_INDEX.contains("UNIQUE"));
    }
}

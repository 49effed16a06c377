//! SQL migration definitions for the jobwatch database.
//!
//! Migrations are applied in order on database open. Each migration records
//! its version in `schema_migrations` once its SQL has run.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![Migration {
        version: 1,
        description: "Initial schema: job_postings keyed by url",
        sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Persisted postings; rows are inserted once and deleted, never updated
CREATE TABLE IF NOT EXISTS job_postings (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    url                TEXT NOT NULL UNIQUE,
    title              TEXT NOT NULL,
    company            TEXT NOT NULL,
    posted_at          TEXT NOT NULL,
    salary_text        TEXT,
    normalized_monthly REAL,
    normalized_yearly  REAL,
    first_seen_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_postings_first_seen ON job_postings(first_seen_at);
"#,
    }]
}

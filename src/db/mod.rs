//! Persistence layer (§6 "Persistent schema").
//!
//! Schema for `user_query`, `user_result`, `exclusions`,
//! `batches`, and `name_first_variant`. The connection is configured
//! the same way the search/index layer configures its own SQLite
//! file: WAL journaling, `synchronous = NORMAL`, and a busy timeout to
//! avoid transient "database is locked" errors under the batch
//! runner's sequential writes.

pub mod queries;

use std::fs;
use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;

/// Open (or create) the persistent store at `path`.
pub fn open(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database, used by tests and by `search`
/// CLI invocations that don't need durability across runs.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;
    initialize_schema(conn)?;
    Ok(())
}

fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS user_query (
            id           INTEGER PRIMARY KEY,
            login_id     TEXT NOT NULL,
            query_json   TEXT NOT NULL,
            search_key   TEXT NOT NULL,
            disabled     INTEGER NOT NULL DEFAULT 0,
            confirmed    INTEGER NOT NULL DEFAULT 0,
            confirmed_at TEXT
        );

        CREATE TABLE IF NOT EXISTS user_result (
            id              INTEGER PRIMARY KEY,
            user_query_id   INTEGER NOT NULL REFERENCES user_query(id),
            batch_id        INTEGER,
            fingerprint     TEXT NOT NULL,
            candidate_json  TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending',
            is_read         INTEGER NOT NULL DEFAULT 0,
            ran_dt          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_user_result_query ON user_result(user_query_id);
        CREATE INDEX IF NOT EXISTS idx_user_result_fingerprint ON user_result(fingerprint);

        CREATE TABLE IF NOT EXISTS exclusions (
            id                  INTEGER PRIMARY KEY,
            scope               TEXT NOT NULL,
            search_key          TEXT,
            fingerprint_excluded TEXT,
            url_excluded        TEXT,
            name_excluded       TEXT,
            reason              TEXT,
            created_at          TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_exclusions_search_key ON exclusions(search_key) WHERE search_key IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_exclusions_global ON exclusions(scope) WHERE scope = 'global';

        CREATE TABLE IF NOT EXISTS batches (
            id            INTEGER PRIMARY KEY,
            input_file    TEXT,
            created_at    TEXT NOT NULL,
            total_queries INTEGER NOT NULL DEFAULT 0,
            total_results INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS name_first_variant (
            id      INTEGER PRIMARY KEY,
            name_a  TEXT NOT NULL,
            name_b  TEXT NOT NULL,
            UNIQUE(name_a, name_b)
        );
        "#,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_and_creates_tables() {
        let conn = open_in_memory().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='user_result'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}

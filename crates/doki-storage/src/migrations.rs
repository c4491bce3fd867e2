//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use doki_core::error::DokiError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), DokiError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| DokiError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| DokiError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: conversations");
    }

    Ok(())
}

/// Version 1: one row per user holding the whole ordered history as JSON.
fn apply_v1(conn: &Connection) -> Result<(), DokiError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS conversations (
            user_id     TEXT PRIMARY KEY NOT NULL,
            history     TEXT NOT NULL DEFAULT '[]',
            version     INTEGER NOT NULL DEFAULT 0,
            updated_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'conversations');
        ",
    )
    .map_err(|e| DokiError::Storage(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_conversations_table_defaults() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute("INSERT INTO conversations (user_id) VALUES ('u1')", [])
            .unwrap();

        let (history, version): (String, i64) = conn
            .query_row(
                "SELECT history, version FROM conversations WHERE user_id = 'u1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(history, "[]");
        assert_eq!(version, 0);
    }
}

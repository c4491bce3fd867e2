//! SQLite-backed conversation repository.
//!
//! One row per user holds the full ordered history as a JSON array plus a
//! version counter that increases on every write.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{Connection, OptionalExtension};
use tracing::warn;

use doki_core::error::DokiError;
use doki_core::types::ConversationTurn;

use crate::db::Database;

/// A conversation row as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredConversation {
    pub user_id: String,
    pub history: Vec<ConversationTurn>,
    /// Incremented on every write; 0 means the row has never been written.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// Repository for per-user conversation records.
#[derive(Debug, Clone)]
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Fetch the record for `user_id`, if any.
    pub fn find(&self, user_id: &str) -> Result<Option<StoredConversation>, DokiError> {
        self.db.with_conn(|conn| read_row(conn, user_id))
    }

    /// Replace the whole history for `user_id`. Returns the new version.
    pub fn save(&self, user_id: &str, history: &[ConversationTurn]) -> Result<u64, DokiError> {
        let json = serde_json::to_string(history)?;
        self.db.with_conn(|conn| write_row(conn, user_id, &json))
    }

    /// Append `turns` to the stored history in a single transaction.
    ///
    /// Concurrent appends for the same user are serialized, so neither
    /// writer's turns are lost. A stored history that no longer parses is
    /// treated as empty and overwritten. Returns the new version.
    pub fn append(&self, user_id: &str, turns: &[ConversationTurn]) -> Result<u64, DokiError> {
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| DokiError::Storage(format!("Failed to begin transaction: {}", e)))?;

            // An unreadable record is replaced, matching what `load` returned.
            let mut history = match read_row(&tx, user_id) {
                Ok(stored) => stored.map(|c| c.history).unwrap_or_default(),
                Err(DokiError::Serialization(e)) => {
                    warn!(user_id, error = %e, "Discarding unreadable conversation history");
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            history.extend_from_slice(turns);
            let json = serde_json::to_string(&history)?;
            let version = write_row(&tx, user_id, &json)?;

            tx.commit()
                .map_err(|e| DokiError::Storage(format!("Failed to commit: {}", e)))?;
            Ok(version)
        })
    }

    /// Delete the record for `user_id`. Returns whether a row existed.
    pub fn delete(&self, user_id: &str) -> Result<bool, DokiError> {
        self.db.with_conn(|conn| {
            let removed = conn
                .execute(
                    "DELETE FROM conversations WHERE user_id = ?1",
                    rusqlite::params![user_id],
                )
                .map_err(|e| DokiError::Storage(format!("Failed to delete conversation: {}", e)))?;
            Ok(removed > 0)
        })
    }

    /// Count stored conversations.
    pub fn count(&self) -> Result<u64, DokiError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
                .map_err(|e| DokiError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

fn read_row(conn: &Connection, user_id: &str) -> Result<Option<StoredConversation>, DokiError> {
    let row = conn
        .query_row(
            "SELECT history, version, updated_at FROM conversations WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .optional()
        .map_err(|e| DokiError::Storage(format!("Failed to load conversation: {}", e)))?;

    match row {
        Some((json, version, updated_at)) => {
            let history: Vec<ConversationTurn> = serde_json::from_str(&json)?;
            Ok(Some(StoredConversation {
                user_id: user_id.to_string(),
                history,
                version: version.max(0) as u64,
                updated_at: Utc
                    .timestamp_opt(updated_at, 0)
                    .single()
                    .unwrap_or_default(),
            }))
        }
        None => Ok(None),
    }
}

fn write_row(conn: &Connection, user_id: &str, history_json: &str) -> Result<u64, DokiError> {
    conn.execute(
        "INSERT INTO conversations (user_id, history, version, updated_at)
         VALUES (?1, ?2, 1, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
            history = excluded.history,
            version = conversations.version + 1,
            updated_at = excluded.updated_at",
        rusqlite::params![user_id, history_json, Utc::now().timestamp()],
    )
    .map_err(|e| DokiError::Storage(format!("Failed to save conversation: {}", e)))?;

    let version: i64 = conn
        .query_row(
            "SELECT version FROM conversations WHERE user_id = ?1",
            rusqlite::params![user_id],
            |row| row.get(0),
        )
        .map_err(|e| DokiError::Storage(e.to_string()))?;
    Ok(version.max(0) as u64)
}

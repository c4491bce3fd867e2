//! Conversation store interface consumed by the orchestrator.
//!
//! Store methods never fail from the caller's point of view: a failed load
//! yields an empty history and a failed write is logged and dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, error};

use doki_core::types::ConversationTurn;

use crate::db::Database;
use crate::repository::ConversationRepository;

/// Per-user ordered conversation history.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// History for `user_id`; empty when there is no record or loading fails.
    async fn load(&self, user_id: &str) -> Vec<ConversationTurn>;

    /// Overwrite the whole history for `user_id` (last write wins).
    async fn save(&self, user_id: &str, history: &[ConversationTurn]);

    /// Append `turns` to the stored history for `user_id` atomically.
    async fn append(&self, user_id: &str, turns: &[ConversationTurn]);

    /// Drop the record for `user_id`.
    async fn clear(&self, user_id: &str);
}

// =============================================================================
// SQLite
// =============================================================================

/// Durable store backed by the `conversations` table.
#[derive(Debug, Clone)]
pub struct SqliteConversationStore {
    repo: ConversationRepository,
}

impl SqliteConversationStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            repo: ConversationRepository::new(db),
        }
    }

    /// The underlying repository, for callers that need versions or counts.
    pub fn repository(&self) -> &ConversationRepository {
        &self.repo
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn load(&self, user_id: &str) -> Vec<ConversationTurn> {
        match self.repo.find(user_id) {
            Ok(Some(stored)) => stored.history,
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(user_id, error = %e, "Error loading conversation");
                Vec::new()
            }
        }
    }

    async fn save(&self, user_id: &str, history: &[ConversationTurn]) {
        match self.repo.save(user_id, history) {
            Ok(version) => debug!(user_id, version, "Conversation saved"),
            Err(e) => error!(user_id, error = %e, "Error saving conversation"),
        }
    }

    async fn append(&self, user_id: &str, turns: &[ConversationTurn]) {
        match self.repo.append(user_id, turns) {
            Ok(version) => debug!(user_id, version, appended = turns.len(), "Conversation saved"),
            Err(e) => error!(user_id, error = %e, "Error saving conversation"),
        }
    }

    async fn clear(&self, user_id: &str) {
        if let Err(e) = self.repo.delete(user_id) {
            error!(user_id, error = %e, "Error clearing conversation");
        }
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Process-local store. Used in tests and when `storage.backend = "memory"`.
#[derive(Debug, Default)]
pub struct MemoryConversationStore {
    conversations: Mutex<HashMap<String, Vec<ConversationTurn>>>,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with a stored conversation.
    pub fn len(&self) -> usize {
        self.conversations.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn load(&self, user_id: &str) -> Vec<ConversationTurn> {
        match self.conversations.lock() {
            Ok(conversations) => conversations.get(user_id).cloned().unwrap_or_default(),
            Err(e) => {
                error!(user_id, error = %e, "Error loading conversation");
                Vec::new()
            }
        }
    }

    async fn save(&self, user_id: &str, history: &[ConversationTurn]) {
        match self.conversations.lock() {
            Ok(mut conversations) => {
                conversations.insert(user_id.to_string(), history.to_vec());
            }
            Err(e) => error!(user_id, error = %e, "Error saving conversation"),
        }
    }

    async fn append(&self, user_id: &str, turns: &[ConversationTurn]) {
        match self.conversations.lock() {
            Ok(mut conversations) => {
                conversations
                    .entry(user_id.to_string())
                    .or_default()
                    .extend_from_slice(turns);
            }
            Err(e) => error!(user_id, error = %e, "Error saving conversation"),
        }
    }

    async fn clear(&self, user_id: &str) {
        match self.conversations.lock() {
            Ok(mut conversations) => {
                conversations.remove(user_id);
            }
            Err(e) => error!(user_id, error = %e, "Error clearing conversation"),
        }
    }
}

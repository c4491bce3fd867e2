//! Doki storage crate - SQLite persistence for conversation history.
//!
//! Provides a WAL-mode SQLite database with migrations, the conversation
//! repository, and the `ConversationStore` interface with durable and
//! in-memory implementations.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod store;

pub use db::Database;
pub use repository::{ConversationRepository, StoredConversation};
pub use store::{ConversationStore, MemoryConversationStore, SqliteConversationStore};

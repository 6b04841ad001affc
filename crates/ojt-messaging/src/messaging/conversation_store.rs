//! Conversation store
//!
//! Database operations for conversation records, including the
//! one-conversation-per-unordered-pair uniqueness enforcement.

use sqlx::Row;

use crate::error::{Error, Result};
use crate::messaging::entity::{canonical_pair, Conversation};
use crate::storage::Database;

/// Conversation store for database operations
pub struct ConversationStore<'a> {
    db: &'a Database,
}

impl<'a> ConversationStore<'a> {
    /// Create a new conversation store
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Look up the conversation for an unordered pair of users.
    ///
    /// Matches regardless of argument order; returns `None` if the two
    /// users have never had a conversation.
    pub async fn find_between(&self, user_a: &str, user_b: &str) -> Result<Option<Conversation>> {
        let (first, second) = canonical_pair(user_a, user_b);

        let row = sqlx::query(
            "SELECT id, user_a, user_b, created_at FROM conversations WHERE user_a = ? AND user_b = ?",
        )
        .bind(first)
        .bind(second)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_conversation))
    }

    /// Create a new conversation between two distinct users.
    ///
    /// Fails with [`Error::InvalidParticipants`] if both ids are the same
    /// user, and with [`Error::DuplicateConversation`] if a conversation
    /// for the pair already exists. Callers are expected to check
    /// [`find_between`](Self::find_between) first; the duplicate error is
    /// the storage-layer backstop for two racing first-contact requests.
    pub async fn create(&self, user_a: &str, user_b: &str) -> Result<Conversation> {
        let conversation = Conversation::new(user_a, user_b)?;

        let result = sqlx::query(
            r#"
            INSERT INTO conversations (id, user_a, user_b, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(&conversation.user_a)
        .bind(&conversation.user_b)
        .bind(conversation.created_at)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => Ok(conversation),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                Error::DuplicateConversation(conversation.user_a, conversation.user_b),
            ),
            Err(err) => Err(err.into()),
        }
    }

    /// List all conversations the given user participates in
    pub async fn list_for(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT id, user_a, user_b, created_at FROM conversations WHERE user_a = ? OR user_b = ?",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_conversation).collect())
    }

    /// Get a conversation by ID
    pub async fn get(&self, id: &str) -> Result<Option<Conversation>> {
        let row =
            sqlx::query("SELECT id, user_a, user_b, created_at FROM conversations WHERE id = ?")
                .bind(id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(row_to_conversation))
    }
}

/// Convert a database row to a Conversation
fn row_to_conversation(row: sqlx::sqlite::SqliteRow) -> Conversation {
    Conversation {
        id: row.get("id"),
        user_a: row.get("user_a"),
        user_b: row.get("user_b"),
        created_at: row.get("created_at"),
    }
}

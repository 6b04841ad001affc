//! Message store
//!
//! Append-only storage for the messages of a conversation. Messages are
//! totally ordered within their conversation by timestamp, with a
//! per-conversation sequence number breaking ties deterministically.

use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::Database;

use super::entity::Message;

/// Maximum message length in Unicode scalar values
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Message store for database operations
pub struct MessageStore<'a> {
    db: &'a Database,
}

impl<'a> MessageStore<'a> {
    /// Create a new message store
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a message to a conversation.
    ///
    /// The text is trimmed before storage; blank text fails with
    /// [`Error::EmptyText`] and text over [`MAX_MESSAGE_CHARS`] with
    /// [`Error::MessageTooLong`]. The sender must be a participant of an
    /// existing conversation. The sequence number is assigned inside the
    /// INSERT, so concurrent appends to the same conversation always get
    /// a well-defined total order and appends to different conversations
    /// never contend on a shared counter.
    pub async fn append(
        &self,
        conversation_id: &str,
        sender_id: &str,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Message> {
        let body = text.trim();
        if body.is_empty() {
            return Err(Error::EmptyText);
        }
        let len = body.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(Error::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }

        let participants: Option<(String, String)> =
            sqlx::query_as("SELECT user_a, user_b FROM conversations WHERE id = ?")
                .bind(conversation_id)
                .fetch_optional(self.db.pool())
                .await?;

        let (user_a, user_b) = participants
            .ok_or_else(|| Error::ConversationNotFound(conversation_id.to_string()))?;
        if sender_id != user_a && sender_id != user_b {
            return Err(Error::SenderNotParticipant {
                conversation_id: conversation_id.to_string(),
                sender_id: sender_id.to_string(),
            });
        }

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, body, seq, created_at)
            VALUES (?, ?, ?, ?,
                    (SELECT COALESCE(MAX(seq), 0) + 1 FROM messages WHERE conversation_id = ?),
                    ?)
            "#,
        )
        .bind(&id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(body)
        .bind(conversation_id)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;

        let (seq,): (i64,) = sqlx::query_as("SELECT seq FROM messages WHERE id = ?")
            .bind(&id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(Message {
            id,
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
            seq,
            created_at,
        })
    }

    /// List all messages in a conversation, ascending by creation time
    /// with insertion order breaking ties
    pub async fn list_for(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, body, seq, created_at FROM messages \
             WHERE conversation_id = ? ORDER BY created_at ASC, seq ASC",
        )
        .bind(conversation_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_message).collect())
    }

    /// Get the most recent message in a conversation, if any
    pub async fn last_for(&self, conversation_id: &str) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, sender_id, body, seq, created_at FROM messages \
             WHERE conversation_id = ? ORDER BY created_at DESC, seq DESC LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_message))
    }
}

/// Convert a database row to a Message
fn row_to_message(row: sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        body: row.get("body"),
        seq: row.get("seq"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::ConversationStore;
    use crate::storage::Database;

    async fn create_test_db() -> Database {
        Database::in_memory()
            .await
            .expect("Failed to create test database")
    }

    async fn create_test_conversation(db: &Database) -> String {
        ConversationStore::new(db)
            .create("alice", "bob")
            .await
            .expect("Failed to create conversation")
            .id
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        for i in 0..5 {
            store
                .append(&conversation_id, "alice", &format!("Message {}", i), Utc::now())
                .await
                .expect("Failed to append");
        }

        let messages = store.list_for(&conversation_id).await.unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].body, "Message 0");
        assert_eq!(messages[4].body, "Message 4");
    }

    #[tokio::test]
    async fn test_append_trims_text() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        let message = store
            .append(&conversation_id, "bob", "  hello  ", Utc::now())
            .await
            .unwrap();

        assert_eq!(message.body, "hello");
    }

    #[tokio::test]
    async fn test_append_rejects_blank_text() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        let err = store
            .append(&conversation_id, "alice", "   ", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyText));

        assert!(store.list_for(&conversation_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_rejects_oversized_text() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        let text = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let err = store
            .append(&conversation_id, "alice", &text, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MessageTooLong { .. }));
    }

    #[tokio::test]
    async fn test_append_unknown_conversation() {
        let db = create_test_db().await;
        let store = MessageStore::new(&db);

        let err = store
            .append("missing", "alice", "hi", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConversationNotFound(_)));
    }

    #[tokio::test]
    async fn test_append_rejects_non_participant_sender() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        let err = store
            .append(&conversation_id, "mallory", "hi", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SenderNotParticipant { .. }));
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_insertion_order() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        let now = Utc::now();
        for i in 0..4 {
            store
                .append(&conversation_id, "alice", &format!("tied {}", i), now)
                .await
                .unwrap();
        }

        // Re-query twice: the tie-break order must be stable
        for _ in 0..2 {
            let messages = store.list_for(&conversation_id).await.unwrap();
            let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
            assert_eq!(bodies, vec!["tied 0", "tied 1", "tied 2", "tied 3"]);
            assert_eq!(messages.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        }
    }

    #[tokio::test]
    async fn test_last_for() {
        let db = create_test_db().await;
        let conversation_id = create_test_conversation(&db).await;
        let store = MessageStore::new(&db);

        assert!(store.last_for(&conversation_id).await.unwrap().is_none());

        store
            .append(&conversation_id, "alice", "first", Utc::now())
            .await
            .unwrap();
        store
            .append(&conversation_id, "bob", "second", Utc::now())
            .await
            .unwrap();

        let last = store.last_for(&conversation_id).await.unwrap().unwrap();
        assert_eq!(last.body, "second");
        assert_eq!(last.sender_id, "bob");
    }

    #[tokio::test]
    async fn test_sequences_are_scoped_per_conversation() {
        let db = create_test_db().await;
        let conv_store = ConversationStore::new(&db);
        let first = conv_store.create("alice", "bob").await.unwrap().id;
        let second = conv_store.create("alice", "carol").await.unwrap().id;
        let store = MessageStore::new(&db);

        store.append(&first, "alice", "a1", Utc::now()).await.unwrap();
        store.append(&first, "bob", "a2", Utc::now()).await.unwrap();
        let m = store.append(&second, "alice", "b1", Utc::now()).await.unwrap();

        // The second conversation starts its own sequence at 1
        assert_eq!(m.seq, 1);
    }
}

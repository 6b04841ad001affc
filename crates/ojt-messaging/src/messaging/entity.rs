//! Messaging entities and view projections

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Return the unordered participant pair in canonical storage order.
///
/// The lexicographically smaller id always lands in the first slot, so a
/// pair compares (and constrains) identically no matter which direction
/// the conversation was started from.
pub fn canonical_pair<'a>(user_a: &'a str, user_b: &'a str) -> (&'a str, &'a str) {
    if user_a <= user_b {
        (user_a, user_b)
    } else {
        (user_b, user_a)
    }
}

/// A two-party conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier
    pub id: String,
    /// First participant (canonical order: the smaller user id)
    pub user_a: String,
    /// Second participant
    pub user_b: String,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new conversation between two distinct users.
    ///
    /// The pair is canonicalized regardless of argument order. Fails with
    /// [`Error::InvalidParticipants`] if both ids are the same user.
    pub fn new(user_a: impl Into<String>, user_b: impl Into<String>) -> Result<Self> {
        let (user_a, user_b) = (user_a.into(), user_b.into());
        if user_a == user_b {
            return Err(Error::InvalidParticipants);
        }
        let (first, second) = canonical_pair(&user_a, &user_b);
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_a: first.to_string(),
            user_b: second.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Whether the given user is one of the two participants
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.user_a == user_id || self.user_b == user_id
    }

    /// The participant opposite to the given user, if they are in the
    /// conversation at all
    pub fn other_participant(&self, user_id: &str) -> Option<&str> {
        if self.user_a == user_id {
            Some(&self.user_b)
        } else if self.user_b == user_id {
            Some(&self.user_a)
        } else {
            None
        }
    }
}

/// A single immutable message within a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: String,
    /// ID of the conversation this message belongs to
    pub conversation_id: String,
    /// ID of the sending participant
    pub sender_id: String,
    /// Message text
    pub body: String,
    /// Per-conversation insertion sequence, assigned at append time.
    /// Breaks ties between messages sharing a timestamp.
    pub seq: i64,
    /// When the message was created
    pub created_at: DateTime<Utc>,
}

/// A resolved participant reference (id plus directory display name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
}

/// Conversation listing entry: the other participant and the most recent
/// message, if any
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub other_participant: Participant,
    pub last_message_text: Option<String>,
}

/// A message with its sender resolved for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageView {
    pub id: String,
    pub conversation_id: String,
    pub sender: Participant,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl MessageView {
    /// Project a stored message with its resolved sender
    pub fn from_message(message: Message, sender: Participant) -> Self {
        Self {
            id: message.id,
            conversation_id: message.conversation_id,
            sender,
            text: message.body,
            created_at: message.created_at,
        }
    }
}

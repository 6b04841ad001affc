//! Error types for the messaging core

use thiserror::Error;

/// Result type alias using the messaging core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Messaging core error types
#[derive(Error, Debug)]
pub enum Error {
    /// A conversation needs two distinct participants.
    #[error("A conversation requires two distinct participants")]
    InvalidParticipants,

    /// The unordered-pair uniqueness constraint fired on insert. Recovered
    /// internally by re-resolving the existing conversation; callers of the
    /// service layer never observe this variant.
    #[error("A conversation between '{0}' and '{1}' already exists")]
    DuplicateConversation(String, String),

    #[error("Conversation '{0}' not found")]
    ConversationNotFound(String),

    /// Authorization violation: the acting user is not one of the
    /// conversation's two participants.
    #[error("User '{user_id}' is not a participant of conversation '{conversation_id}'")]
    NotAParticipant {
        conversation_id: String,
        user_id: String,
    },

    #[error("Sender '{sender_id}' is not a participant of conversation '{conversation_id}'")]
    SenderNotParticipant {
        conversation_id: String,
        sender_id: String,
    },

    #[error("Message text must not be empty")]
    EmptyText,

    #[error("Message text is {len} characters, maximum is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is an internal duplicate-insert signal that the
    /// service layer recovers from rather than surfacing.
    pub fn is_duplicate_conversation(&self) -> bool {
        matches!(self, Self::DuplicateConversation(..))
    }
}

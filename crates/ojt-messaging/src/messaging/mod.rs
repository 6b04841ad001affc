//! Direct-messaging domain
//!
//! Two-party conversations and their append-only message streams. The
//! stores enforce the storage invariants (one conversation per unordered
//! participant pair, total message order per conversation); the service
//! layer combines them with the user directory into the operations the
//! request layer consumes.

pub mod conversation_store;
pub mod entity;
pub mod message_store;
pub mod service;

pub use conversation_store::ConversationStore;
pub use entity::{Conversation, ConversationSummary, Message, MessageView, Participant};
pub use message_store::{MessageStore, MAX_MESSAGE_CHARS};
pub use service::ConversationService;

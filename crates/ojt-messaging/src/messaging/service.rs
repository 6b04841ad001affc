//! Conversation service
//!
//! Orchestrates the conversation and message stores together with the
//! user directory. This is the surface the request layer calls after it
//! has resolved the acting user from session/auth context; the acting
//! user is always an explicit parameter, never ambient state.

use std::sync::Arc;

use chrono::Utc;

use crate::directory::UserDirectory;
use crate::error::{Error, Result};
use crate::storage::Database;

use super::conversation_store::ConversationStore;
use super::entity::{Conversation, ConversationSummary, MessageView, Participant};
use super::message_store::MessageStore;

/// Service for two-party conversations and their message streams.
///
/// Holds no mutable state between calls; all shared state lives in the
/// database, so the service can be cloned freely across request handlers.
#[derive(Clone)]
pub struct ConversationService {
    db: Database,
    directory: Arc<dyn UserDirectory>,
}

impl ConversationService {
    /// Create a new conversation service
    pub fn new(db: Database, directory: Arc<dyn UserDirectory>) -> Self {
        Self { db, directory }
    }

    /// Return the id of the conversation between the two users, creating
    /// it on first contact.
    ///
    /// Idempotent: any number of calls, in either argument order and from
    /// any number of concurrent callers, resolve to the same conversation.
    /// A storage-layer duplicate from a racing first contact is recovered
    /// here by re-resolving the winner's row and never reaches the caller.
    pub async fn start_or_get_conversation(
        &self,
        current_user_id: &str,
        other_user_id: &str,
    ) -> Result<String> {
        if current_user_id == other_user_id {
            return Err(Error::InvalidParticipants);
        }
        self.ensure_user_exists(current_user_id).await?;
        self.ensure_user_exists(other_user_id).await?;

        let store = ConversationStore::new(&self.db);

        if let Some(conversation) = store.find_between(current_user_id, other_user_id).await? {
            return Ok(conversation.id);
        }

        match store.create(current_user_id, other_user_id).await {
            Ok(conversation) => {
                tracing::info!(
                    conversation_id = %conversation.id,
                    user_a = %conversation.user_a,
                    user_b = %conversation.user_b,
                    "Created conversation"
                );
                Ok(conversation.id)
            }
            Err(err) if err.is_duplicate_conversation() => {
                // Lost the first-contact race; the winner's row is visible now.
                tracing::debug!(
                    user_a = current_user_id,
                    user_b = other_user_id,
                    "Concurrent conversation creation detected, reusing existing"
                );
                let conversation = store
                    .find_between(current_user_id, other_user_id)
                    .await?
                    .ok_or(err)?;
                Ok(conversation.id)
            }
            Err(err) => Err(err),
        }
    }

    /// List the user's conversations with the other participant resolved
    /// and the most recent message as a preview.
    ///
    /// Sorted by last-message time descending; a conversation without
    /// messages sorts on its creation time instead, so fresh empty
    /// conversations keep a stable position. Ties break on conversation
    /// id ascending.
    pub async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let conv_store = ConversationStore::new(&self.db);
        let msg_store = MessageStore::new(&self.db);

        let mut entries = Vec::new();
        for conversation in conv_store.list_for(user_id).await? {
            // list_for only returns conversations the user is in
            let other_id = conversation
                .other_participant(user_id)
                .unwrap_or(&conversation.user_a)
                .to_string();
            let other = self.resolve_participant(&other_id).await?;
            let last = msg_store.last_for(&conversation.id).await?;

            let sort_key = last
                .as_ref()
                .map(|m| m.created_at)
                .unwrap_or(conversation.created_at);
            entries.push((
                sort_key,
                ConversationSummary {
                    conversation_id: conversation.id,
                    other_participant: other,
                    last_message_text: last.map(|m| m.body),
                },
            ));
        }

        entries.sort_by(|(time_a, sum_a), (time_b, sum_b)| {
            time_b
                .cmp(time_a)
                .then_with(|| sum_a.conversation_id.cmp(&sum_b.conversation_id))
        });

        Ok(entries.into_iter().map(|(_, summary)| summary).collect())
    }

    /// Return the full ascending message history of a conversation.
    ///
    /// Fails with [`Error::NotAParticipant`] if the requesting user is
    /// not one of the conversation's two participants.
    pub async fn get_history(
        &self,
        conversation_id: &str,
        requesting_user_id: &str,
    ) -> Result<Vec<MessageView>> {
        let conversation = self
            .authorized_conversation(conversation_id, requesting_user_id)
            .await?;

        // Only two possible senders per conversation; resolve both once
        let user_a = self.resolve_participant(&conversation.user_a).await?;
        let user_b = self.resolve_participant(&conversation.user_b).await?;

        let messages = MessageStore::new(&self.db).list_for(conversation_id).await?;
        Ok(messages
            .into_iter()
            .map(|message| {
                let sender = if message.sender_id == user_a.id {
                    user_a.clone()
                } else {
                    user_b.clone()
                };
                MessageView::from_message(message, sender)
            })
            .collect())
    }

    /// Append a message to a conversation on behalf of a participant.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        sender_id: &str,
        text: &str,
    ) -> Result<MessageView> {
        self.authorized_conversation(conversation_id, sender_id)
            .await?;

        let message = MessageStore::new(&self.db)
            .append(conversation_id, sender_id, text, Utc::now())
            .await?;
        tracing::debug!(
            conversation_id = conversation_id,
            message_id = %message.id,
            seq = message.seq,
            "Appended message"
        );

        let sender = self.resolve_participant(sender_id).await?;
        Ok(MessageView::from_message(message, sender))
    }

    /// Fetch a conversation and check that the acting user is one of its
    /// participants
    async fn authorized_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<Conversation> {
        let conversation = ConversationStore::new(&self.db)
            .get(conversation_id)
            .await?
            .ok_or_else(|| Error::ConversationNotFound(conversation_id.to_string()))?;

        if !conversation.has_participant(user_id) {
            tracing::warn!(
                conversation_id = conversation_id,
                user_id = user_id,
                "Rejected access by non-participant"
            );
            return Err(Error::NotAParticipant {
                conversation_id: conversation_id.to_string(),
                user_id: user_id.to_string(),
            });
        }
        Ok(conversation)
    }

    async fn ensure_user_exists(&self, user_id: &str) -> Result<()> {
        if self.directory.exists(user_id).await? {
            Ok(())
        } else {
            Err(Error::UserNotFound(user_id.to_string()))
        }
    }

    /// Resolve a participant through the directory. A user the directory
    /// no longer knows (removed account) falls back to the raw id so old
    /// histories stay readable.
    async fn resolve_participant(&self, user_id: &str) -> Result<Participant> {
        let display_name = self
            .directory
            .display_name(user_id)
            .await?
            .unwrap_or_else(|| user_id.to_string());
        Ok(Participant {
            id: user_id.to_string(),
            display_name,
        })
    }
}

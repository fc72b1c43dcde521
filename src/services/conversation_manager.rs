//! Conversation threading and message history.
//!
//! Same caching discipline as the context manager: active conversations live
//! in an in-memory map, reads fall through to the store, and store failures
//! degrade to best-effort rather than surfacing to callers.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::domain::models::{
    Conversation, ConversationStatistics, ConversationStatus, McpMessage, StoredMessage,
};
use crate::domain::ports::MemoryStore;

/// Default cap on messages returned for a conversation.
pub const DEFAULT_MESSAGE_LIMIT: usize = 100;

/// Default cap on conversations returned by a listing.
pub const DEFAULT_CONVERSATION_LIMIT: usize = 50;

pub struct ConversationManager<S: MemoryStore> {
    store: Arc<S>,
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl<S: MemoryStore> ConversationManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// Start a new conversation with the given title and participants.
    pub async fn create_conversation(
        &self,
        title: &str,
        participants: Vec<String>,
        metadata: Map<String, Value>,
    ) -> Conversation {
        let conversation = Conversation::new(title, participants).with_metadata(metadata);
        debug!(conversation_id = %conversation.conversation_id, %title, "conversation created");
        self.insert_conversation(conversation.clone()).await;
        conversation
    }

    /// Look up a conversation, cache first, falling back to the store.
    pub async fn get_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        if let Some(conversation) = self.conversations.read().await.get(conversation_id) {
            return Some(conversation.clone());
        }

        match self.store.get_conversation(conversation_id).await {
            Ok(Some(conversation)) => {
                self.conversations
                    .write()
                    .await
                    .insert(conversation_id.to_string(), conversation.clone());
                Some(conversation)
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%conversation_id, %error, "failed to load conversation from store");
                None
            }
        }
    }

    /// Append a message to its conversation, creating the conversation on
    /// first use. Returns false when the message carries no conversation id.
    ///
    /// An auto-created conversation keeps the id the message referenced, so
    /// a later message with the same id lands in the same conversation.
    pub async fn add_message_to_conversation(&self, message: &McpMessage) -> bool {
        let Some(conversation_id) = message.conversation_id.as_deref() else {
            warn!(message_id = %message.id, "message has no conversation id");
            return false;
        };

        let mut conversation = match self.get_conversation(conversation_id).await {
            Some(conversation) => conversation,
            None => {
                let mut metadata = Map::new();
                metadata.insert("auto_created".to_string(), json!(true));
                debug!(%conversation_id, "auto-creating conversation");
                Conversation::with_id(
                    conversation_id,
                    format!("Conversation with {}", message.sender_id),
                    Vec::new(),
                )
                .with_metadata(metadata)
            }
        };

        conversation.add_participant(&message.sender_id);
        if let Some(recipient_id) = message.recipient_id.as_deref() {
            conversation.add_participant(recipient_id);
        }
        conversation.touch();

        if let Err(error) = self.store.store_message(message).await {
            warn!(%conversation_id, message_id = %message.id, %error, "failed to persist message");
        }
        self.insert_conversation(conversation).await;

        true
    }

    /// Conversation history in timestamp order, capped at `limit`.
    pub async fn get_conversation_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Vec<StoredMessage> {
        match self
            .store
            .get_conversation_messages(conversation_id, limit)
            .await
        {
            Ok(messages) => messages,
            Err(error) => {
                warn!(%conversation_id, %error, "failed to load conversation messages");
                Vec::new()
            }
        }
    }

    /// Conversations newest-updated first, optionally restricted to those a
    /// given agent participates in. Merges the cache over the store view.
    pub async fn list_conversations(
        &self,
        participant_id: Option<&str>,
        limit: usize,
    ) -> Vec<Conversation> {
        let mut merged: HashMap<String, Conversation> = HashMap::new();

        match self.store.list_conversations(participant_id, limit).await {
            Ok(conversations) => {
                for conversation in conversations {
                    merged.insert(conversation.conversation_id.clone(), conversation);
                }
            }
            Err(error) => warn!(%error, "failed to list conversations from store"),
        }

        for conversation in self.conversations.read().await.values() {
            if participant_id.is_none_or(|id| conversation.has_participant(id)) {
                merged.insert(conversation.conversation_id.clone(), conversation.clone());
            }
        }

        let mut conversations: Vec<Conversation> = merged.into_values().collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        conversations.truncate(limit);
        conversations
    }

    /// Archive a conversation and evict it from the active cache. Returns
    /// false when the conversation is unknown.
    pub async fn archive_conversation(&self, conversation_id: &str) -> bool {
        let Some(mut conversation) = self.get_conversation(conversation_id).await else {
            return false;
        };

        conversation.archive();
        if let Err(error) = self.store.store_conversation(&conversation).await {
            warn!(%conversation_id, %error, "failed to persist archived conversation");
        }
        self.conversations.write().await.remove(conversation_id);

        true
    }

    pub async fn get_statistics(&self) -> ConversationStatistics {
        let conversations = self.conversations.read().await;
        let active: Vec<&Conversation> = conversations
            .values()
            .filter(|conversation| conversation.status == ConversationStatus::Active)
            .collect();

        let total_participants = active
            .iter()
            .map(|conversation| conversation.participants.len())
            .sum();
        let total_threads = active
            .iter()
            .map(|conversation| conversation.threads.len())
            .sum();
        let active_conversations = active.len();
        drop(conversations);

        let (stored_conversations, stored_messages) = match self.store.get_statistics().await {
            Ok(stats) => (stats.total_conversations, stats.total_messages),
            Err(error) => {
                warn!(%error, "failed to read store statistics");
                (0, 0)
            }
        };

        ConversationStatistics {
            active_conversations,
            total_participants,
            total_threads,
            stored_conversations,
            stored_messages,
        }
    }

    async fn insert_conversation(&self, conversation: Conversation) {
        if let Err(error) = self.store.store_conversation(&conversation).await {
            warn!(conversation_id = %conversation.conversation_id, %error, "failed to persist conversation");
        }
        self.conversations
            .write()
            .await
            .insert(conversation.conversation_id.clone(), conversation);
    }
}

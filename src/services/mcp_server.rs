//! Message dispatch facade.
//!
//! Owns the context and conversation managers, answers every inbound message
//! with exactly one response, and fans system broadcasts out to subscribers.
//! A malformed or failing message never propagates an error to the caller;
//! it becomes a failure response addressed back to the sender.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::models::protocol::{
    AgentRegisterPayload, AgentStatusPayload, ContextSharePayload, ConversationEndPayload,
    ConversationStartPayload, MemoryRetrievePayload, MemoryStorePayload,
};
use crate::domain::models::{
    AgentInfo, AgentType, ContextData, Conversation, McpMessage, McpResponse, MessagePayload,
    ServerInfo, ServerStatistics, StoredMessage,
};
use crate::domain::ports::MemoryStore;

use super::context_manager::ContextManager;
use super::conversation_manager::{
    ConversationManager, DEFAULT_CONVERSATION_LIMIT, DEFAULT_MESSAGE_LIMIT,
};

/// Capabilities advertised by the server's own agent record.
const SERVER_CAPABILITIES: [&str; 3] = [
    "context_management",
    "conversation_threading",
    "memory_storage",
];

/// Context type tags returned by an untyped context listing.
const STANDARD_CONTEXT_TYPES: [&str; 4] = ["general", "conversation", "system", "agent_state"];

pub struct McpServer<S: MemoryStore> {
    agent_id: String,
    contexts: ContextManager<S>,
    conversations: ConversationManager<S>,
    broadcasts: broadcast::Sender<McpMessage>,
}

impl<S: MemoryStore> McpServer<S> {
    pub fn new(store: Arc<S>, agent_id: impl Into<String>, broadcast_capacity: usize) -> Self {
        let (broadcasts, _) = broadcast::channel(broadcast_capacity);
        Self {
            agent_id: agent_id.into(),
            contexts: ContextManager::new(Arc::clone(&store)),
            conversations: ConversationManager::new(store),
            broadcasts,
        }
    }

    /// Register the server's own agent record and sweep stale contexts.
    pub async fn start(&self) {
        let mut metadata = Map::new();
        metadata.insert("version".to_string(), json!(env!("CARGO_PKG_VERSION")));
        metadata.insert("started_at".to_string(), json!(Utc::now().to_rfc3339()));

        let agent = AgentInfo::new(&self.agent_id, AgentType::MonitorAgent, "MCP Context Server")
            .with_capabilities(SERVER_CAPABILITIES.iter().map(|s| s.to_string()).collect())
            .with_metadata(metadata);
        self.contexts.register_agent(agent).await;

        let removed = self.contexts.cleanup_expired_contexts().await;
        info!(agent_id = %self.agent_id, expired_removed = removed, "server started");
    }

    /// Mark the server agent stopped. Data stays in place.
    pub async fn stop(&self) {
        self.contexts
            .update_agent_status(&self.agent_id, "stopped", Map::new())
            .await;
        info!(agent_id = %self.agent_id, "server stopped");
    }

    /// Subscribe to system broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<McpMessage> {
        self.broadcasts.subscribe()
    }

    /// Decode and dispatch one raw message, always producing a response.
    pub async fn process_message(&self, raw: Value) -> McpResponse {
        let message: McpMessage = match serde_json::from_value(raw.clone()) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "failed to decode message");
                return McpResponse::failure(
                    &self.agent_id,
                    correlation_from_raw(&raw),
                    format!("Invalid message: {error}"),
                );
            }
        };

        self.dispatch(message).await
    }

    /// Dispatch an already-decoded message.
    pub async fn dispatch(&self, message: McpMessage) -> McpResponse {
        debug!(
            message_id = %message.id,
            message_type = %message.message_type().as_str(),
            sender_id = %message.sender_id,
            "dispatching message"
        );

        // Any message referencing a conversation lands in its history,
        // whatever its type.
        if message.conversation_id.is_some() {
            self.conversations.add_message_to_conversation(&message).await;
        }

        let payload = message.payload.clone();
        match payload {
            MessagePayload::ContextShare(payload) => self.handle_context_share(&message, payload).await,
            MessagePayload::ConversationStart(payload) => {
                self.handle_conversation_start(&message, payload).await
            }
            MessagePayload::ConversationMessage(_) => {
                self.handle_conversation_message(&message).await
            }
            MessagePayload::ConversationEnd(payload) => {
                self.handle_conversation_end(&message, payload).await
            }
            MessagePayload::MemoryStore(payload) => self.handle_memory_store(&message, payload).await,
            MessagePayload::MemoryRetrieve(payload) => {
                self.handle_memory_retrieve(&message, payload).await
            }
            MessagePayload::AgentRegister(payload) => {
                self.handle_agent_register(&message, payload).await
            }
            MessagePayload::AgentStatus(payload) => self.handle_agent_status(&message, payload).await,
            MessagePayload::SystemBroadcast(_) => self.handle_system_broadcast(&message),
        }
    }

    async fn handle_context_share(
        &self,
        message: &McpMessage,
        payload: ContextSharePayload,
    ) -> McpResponse {
        let context = self
            .contexts
            .store_context(
                &payload.context_type,
                payload.data,
                payload.metadata,
                payload.expires_in_minutes,
            )
            .await;

        let mut shared_with_recipient = false;
        if let Some(recipient_id) = message.recipient_id.as_deref() {
            shared_with_recipient = self
                .contexts
                .share_context_with_agent(context.context_id, recipient_id)
                .await;
        }

        let mut data = Map::new();
        data.insert("context_id".to_string(), json!(context.context_id));
        data.insert("context_type".to_string(), json!(context.context_type));
        data.insert("expires_at".to_string(), json!(context.expires_at));
        data.insert(
            "shared_with_recipient".to_string(),
            json!(shared_with_recipient),
        );
        self.respond(message, data)
    }

    async fn handle_conversation_start(
        &self,
        message: &McpMessage,
        payload: ConversationStartPayload,
    ) -> McpResponse {
        let title = payload
            .title
            .unwrap_or_else(|| format!("Conversation started by {}", message.sender_id));

        let mut participants = payload.participants;
        if !participants.iter().any(|id| id == &message.sender_id) {
            participants.push(message.sender_id.clone());
        }

        let conversation = self
            .conversations
            .create_conversation(&title, participants, payload.metadata)
            .await;
        let context = self
            .contexts
            .create_conversation_context(&conversation.conversation_id, &conversation.participants)
            .await;

        let mut data = Map::new();
        data.insert(
            "conversation_id".to_string(),
            json!(conversation.conversation_id),
        );
        data.insert("context_id".to_string(), json!(context.context_id));
        data.insert("title".to_string(), json!(conversation.title));
        data.insert(
            "participants".to_string(),
            json!(conversation.participants),
        );
        self.respond(message, data)
    }

    async fn handle_conversation_message(&self, message: &McpMessage) -> McpResponse {
        // The history append already happened in dispatch; here we stamp the
        // conversation's context with the latest activity. A message without
        // a conversation id is still acknowledged.
        if let Some(conversation_id) = message.conversation_id.as_deref() {
            let mut update = Map::new();
            update.insert(
                "last_message_at".to_string(),
                json!(message.timestamp.to_rfc3339()),
            );
            update.insert("last_message_from".to_string(), json!(message.sender_id));
            self.contexts
                .update_conversation_context(conversation_id, update)
                .await;
        }

        let mut data = Map::new();
        data.insert("conversation_id".to_string(), json!(message.conversation_id));
        data.insert("message_id".to_string(), json!(message.id));
        self.respond(message, data)
    }

    async fn handle_conversation_end(
        &self,
        message: &McpMessage,
        payload: ConversationEndPayload,
    ) -> McpResponse {
        let conversation_id = payload
            .conversation_id
            .or_else(|| message.conversation_id.clone());
        let Some(conversation_id) = conversation_id else {
            return McpResponse::failure(
                &self.agent_id,
                message.correlation_id(),
                "conversation_end requires a conversation_id",
            );
        };

        if !self.conversations.archive_conversation(&conversation_id).await {
            return McpResponse::failure(
                &self.agent_id,
                message.correlation_id(),
                format!("Conversation not found: {conversation_id}"),
            );
        }

        let mut update = Map::new();
        update.insert("status".to_string(), json!("archived"));
        update.insert("ended_by".to_string(), json!(message.sender_id));
        self.contexts
            .update_conversation_context(&conversation_id, update)
            .await;

        let mut data = Map::new();
        data.insert("conversation_id".to_string(), json!(conversation_id));
        data.insert("status".to_string(), json!("archived"));
        self.respond(message, data)
    }

    async fn handle_memory_store(
        &self,
        message: &McpMessage,
        payload: MemoryStorePayload,
    ) -> McpResponse {
        let context = self
            .contexts
            .store_context(&payload.memory_type, payload.data, payload.metadata, None)
            .await;

        let mut data = Map::new();
        data.insert("context_id".to_string(), json!(context.context_id));
        data.insert("memory_type".to_string(), json!(context.context_type));
        self.respond(message, data)
    }

    async fn handle_memory_retrieve(
        &self,
        message: &McpMessage,
        payload: MemoryRetrievePayload,
    ) -> McpResponse {
        if let Some(context_id) = payload.context_id {
            let Some(context) = self.contexts.retrieve_context(context_id).await else {
                return McpResponse::failure(
                    &self.agent_id,
                    message.correlation_id(),
                    format!("Context not found: {context_id}"),
                );
            };

            let mut data = Map::new();
            data.insert("context".to_string(), json!(context));
            return self.respond(message, data);
        }

        if let Some(memory_type) = payload.memory_type.as_deref() {
            let contexts = self.contexts.retrieve_contexts_by_type(memory_type).await;
            let mut data = Map::new();
            data.insert("count".to_string(), json!(contexts.len()));
            data.insert("contexts".to_string(), json!(contexts));
            return self.respond(message, data);
        }

        McpResponse::failure(
            &self.agent_id,
            message.correlation_id(),
            "memory_retrieve requires a context_id or memory_type",
        )
    }

    async fn handle_agent_register(
        &self,
        message: &McpMessage,
        payload: AgentRegisterPayload,
    ) -> McpResponse {
        let name = payload.name.unwrap_or_else(|| message.sender_id.clone());
        let agent = AgentInfo::new(&message.sender_id, payload.agent_type, name)
            .with_capabilities(payload.capabilities)
            .with_metadata(payload.metadata);
        let agent = self.contexts.register_agent(agent).await;

        let mut data = Map::new();
        data.insert("agent_id".to_string(), json!(agent.agent_id));
        data.insert("agent_type".to_string(), json!(agent.agent_type));
        data.insert("status".to_string(), json!("registered"));
        self.respond(message, data)
    }

    async fn handle_agent_status(
        &self,
        message: &McpMessage,
        payload: AgentStatusPayload,
    ) -> McpResponse {
        let updated = self
            .contexts
            .update_agent_status(&message.sender_id, &payload.status, payload.metadata)
            .await;

        if !updated {
            return McpResponse::failure(
                &self.agent_id,
                message.correlation_id(),
                format!("Agent not registered: {}", message.sender_id),
            );
        }

        let mut data = Map::new();
        data.insert("agent_id".to_string(), json!(message.sender_id));
        data.insert("status".to_string(), json!(payload.status));
        self.respond(message, data)
    }

    fn handle_system_broadcast(&self, message: &McpMessage) -> McpResponse {
        // send fails only when nobody is subscribed; that still counts as a
        // delivered broadcast to zero recipients.
        let recipients = self.broadcasts.send(message.clone()).unwrap_or(0);
        debug!(message_id = %message.id, recipients, "broadcast delivered");

        let mut data = Map::new();
        data.insert("recipients".to_string(), json!(recipients));
        self.respond(message, data)
    }

    fn respond(&self, message: &McpMessage, data: Map<String, Value>) -> McpResponse {
        McpResponse::success(
            &self.agent_id,
            Some(message.sender_id.clone()),
            message.correlation_id(),
            data,
        )
    }

    // Query surface used by the CLI and dashboards.

    pub async fn get_conversations(
        &self,
        participant_id: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<Conversation> {
        self.conversations
            .list_conversations(participant_id, limit.unwrap_or(DEFAULT_CONVERSATION_LIMIT))
            .await
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Option<Conversation> {
        self.conversations.get_conversation(conversation_id).await
    }

    pub async fn get_conversation_messages(
        &self,
        conversation_id: &str,
        limit: Option<usize>,
    ) -> Vec<StoredMessage> {
        self.conversations
            .get_conversation_messages(conversation_id, limit.unwrap_or(DEFAULT_MESSAGE_LIMIT))
            .await
    }

    pub async fn get_agents(
        &self,
        agent_type: Option<&str>,
        status: Option<&str>,
    ) -> Vec<AgentInfo> {
        self.contexts.list_agents(agent_type, status).await
    }

    /// Contexts of one type, or the union of the standard types when none is
    /// given.
    pub async fn get_contexts(&self, context_type: Option<&str>) -> Vec<ContextData> {
        match context_type {
            Some(context_type) => self.contexts.retrieve_contexts_by_type(context_type).await,
            None => {
                let mut contexts = Vec::new();
                for context_type in STANDARD_CONTEXT_TYPES {
                    contexts.extend(self.contexts.retrieve_contexts_by_type(context_type).await);
                }
                contexts
            }
        }
    }

    pub async fn get_agent_contexts(&self, agent_id: &str) -> Vec<ContextData> {
        self.contexts.get_agent_contexts(agent_id).await
    }

    pub async fn cleanup_expired_contexts(&self) -> u64 {
        self.contexts.cleanup_expired_contexts().await
    }

    pub async fn get_statistics(&self) -> ServerStatistics {
        ServerStatistics {
            server_info: ServerInfo {
                version: env!("CARGO_PKG_VERSION").to_string(),
                agent_id: self.agent_id.clone(),
                subscribers: self.broadcasts.receiver_count(),
            },
            contexts: self.contexts.get_statistics().await,
            conversations: self.conversations.get_statistics().await,
        }
    }
}

/// Best-effort correlation id for a message that failed to decode.
fn correlation_from_raw(raw: &Value) -> Uuid {
    raw.get("request_id")
        .or_else(|| raw.get("id"))
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
}

//! Persistence seam for contexts, messages, conversations, and agents.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AgentInfo, ContextData, Conversation, McpMessage, StoredMessage, StoreStatistics,
};

/// Durable key-based storage backing the broker.
///
/// Every method returns an explicit `DomainResult`; the manager layer decides
/// where to degrade to best-effort (log and continue) rather than propagate.
/// Writes commit individually; no transaction spans store calls.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Upsert a context by id.
    async fn store_context(&self, context: &ContextData) -> DomainResult<()>;

    /// Load a context by id. An expired row is deleted as a side effect and
    /// reported as absent.
    async fn retrieve_context(&self, context_id: Uuid) -> DomainResult<Option<ContextData>>;

    /// Load all contexts with the given type tag, newest-created first.
    /// Expired rows encountered are deleted and excluded.
    async fn retrieve_contexts_by_type(&self, context_type: &str) -> DomainResult<Vec<ContextData>>;

    /// Hard delete; returns whether a row was removed.
    async fn delete_context(&self, context_id: Uuid) -> DomainResult<bool>;

    /// Bulk-delete all contexts whose expiry is in the past; returns the count removed.
    async fn cleanup_expired_contexts(&self) -> DomainResult<u64>;

    /// Append-only insert of a message envelope.
    async fn store_message(&self, message: &McpMessage) -> DomainResult<()>;

    /// Messages for a conversation, ascending timestamp order, capped at `limit`.
    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> DomainResult<Vec<StoredMessage>>;

    /// Upsert a conversation by id.
    async fn store_conversation(&self, conversation: &Conversation) -> DomainResult<()>;

    async fn get_conversation(&self, conversation_id: &str) -> DomainResult<Option<Conversation>>;

    /// Conversations newest-updated first, optionally filtered to those whose
    /// participant list contains `participant_id`.
    async fn list_conversations(
        &self,
        participant_id: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<Conversation>>;

    /// Upsert an agent record by id.
    async fn store_agent(&self, agent: &AgentInfo) -> DomainResult<()>;

    async fn get_agent(&self, agent_id: &str) -> DomainResult<Option<AgentInfo>>;

    /// Hard delete; returns whether a row was removed.
    async fn delete_agent(&self, agent_id: &str) -> DomainResult<bool>;

    /// Agents newest-seen first, optionally filtered by type.
    async fn list_agents(&self, agent_type: Option<&str>) -> DomainResult<Vec<AgentInfo>>;

    /// Row counts across all four tables.
    async fn get_statistics(&self) -> DomainResult<StoreStatistics>;
}

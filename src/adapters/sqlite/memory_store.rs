//! SQLite implementation of the MemoryStore port.
//!
//! Four tables (contexts, messages, conversations, agents) with JSON text
//! blobs in the payload columns. Expired contexts are deleted lazily when a
//! read encounters them, and in bulk by `cleanup_expired_contexts`.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AgentInfo, AgentType, ContextData, Conversation, ConversationStatus, McpMessage,
    MessageType, StoredMessage, StoreStatistics,
};
use crate::domain::ports::MemoryStore;

#[derive(Clone)]
pub struct SqliteMemoryStore {
    pool: SqlitePool,
}

impl SqliteMemoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemoryStore {
    async fn store_context(&self, context: &ContextData) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO contexts
               (context_id, context_type, data, metadata, expires_at, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(context.context_id.to_string())
        .bind(&context.context_type)
        .bind(serde_json::to_string(&context.data)?)
        .bind(serde_json::to_string(&context.metadata)?)
        .bind(context.expires_at.map(|t| t.to_rfc3339()))
        .bind(context.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn retrieve_context(&self, context_id: Uuid) -> DomainResult<Option<ContextData>> {
        let row: Option<ContextRow> = sqlx::query_as("SELECT * FROM contexts WHERE context_id = ?")
            .bind(context_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let context: ContextData = row.try_into()?;

        if context.is_expired() {
            self.delete_context(context_id).await?;
            return Ok(None);
        }

        Ok(Some(context))
    }

    async fn retrieve_contexts_by_type(&self, context_type: &str) -> DomainResult<Vec<ContextData>> {
        let rows: Vec<ContextRow> = sqlx::query_as(
            "SELECT * FROM contexts WHERE context_type = ? ORDER BY created_at DESC",
        )
        .bind(context_type)
        .fetch_all(&self.pool)
        .await?;

        let mut contexts = Vec::with_capacity(rows.len());
        for row in rows {
            let context: ContextData = row.try_into()?;
            if context.is_expired() {
                self.delete_context(context.context_id).await?;
            } else {
                contexts.push(context);
            }
        }

        Ok(contexts)
    }

    async fn delete_context(&self, context_id: Uuid) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM contexts WHERE context_id = ?")
            .bind(context_id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_expired_contexts(&self) -> DomainResult<u64> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "DELETE FROM contexts WHERE expires_at IS NOT NULL AND expires_at < ?",
        )
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn store_message(&self, message: &McpMessage) -> DomainResult<()> {
        let stored = StoredMessage::from(message);

        sqlx::query(
            r#"INSERT INTO messages
               (message_id, message_type, sender_id, sender_type, recipient_id,
                timestamp, payload, conversation_id, thread_id)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(stored.message_id.to_string())
        .bind(stored.message_type.as_str())
        .bind(&stored.sender_id)
        .bind(stored.sender_type.as_str())
        .bind(&stored.recipient_id)
        .bind(stored.timestamp.to_rfc3339())
        .bind(serde_json::to_string(&stored.payload)?)
        .bind(&stored.conversation_id)
        .bind(&stored.thread_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_conversation_messages(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> DomainResult<Vec<StoredMessage>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"SELECT * FROM messages
               WHERE conversation_id = ?
               ORDER BY timestamp ASC
               LIMIT ?"#,
        )
        .bind(conversation_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn store_conversation(&self, conversation: &Conversation) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO conversations
               (conversation_id, title, participants, created_at, updated_at, status, metadata, threads)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&conversation.conversation_id)
        .bind(&conversation.title)
        .bind(serde_json::to_string(&conversation.participants)?)
        .bind(conversation.created_at.to_rfc3339())
        .bind(conversation.updated_at.to_rfc3339())
        .bind(conversation.status.as_str())
        .bind(serde_json::to_string(&conversation.metadata)?)
        .bind(serde_json::to_string(&conversation.threads)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_conversation(&self, conversation_id: &str) -> DomainResult<Option<Conversation>> {
        let row: Option<ConversationRow> =
            sqlx::query_as("SELECT * FROM conversations WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_conversations(
        &self,
        participant_id: Option<&str>,
        limit: usize,
    ) -> DomainResult<Vec<Conversation>> {
        // Participants is a JSON array of quoted ids, so a LIKE on the quoted
        // form filters without unpacking the blob.
        let rows: Vec<ConversationRow> = if let Some(participant_id) = participant_id {
            sqlx::query_as(
                r#"SELECT * FROM conversations
                   WHERE participants LIKE ?
                   ORDER BY updated_at DESC
                   LIMIT ?"#,
            )
            .bind(format!("%\"{participant_id}\"%"))
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as("SELECT * FROM conversations ORDER BY updated_at DESC LIMIT ?")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn store_agent(&self, agent: &AgentInfo) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO agents
               (agent_id, agent_type, name, capabilities, status, last_seen, metadata)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&agent.agent_id)
        .bind(agent.agent_type.as_str())
        .bind(&agent.name)
        .bind(serde_json::to_string(&agent.capabilities)?)
        .bind(&agent.status)
        .bind(agent.last_seen.to_rfc3339())
        .bind(serde_json::to_string(&agent.metadata)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_agent(&self, agent_id: &str) -> DomainResult<Option<AgentInfo>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete_agent(&self, agent_id: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM agents WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_agents(&self, agent_type: Option<&str>) -> DomainResult<Vec<AgentInfo>> {
        let rows: Vec<AgentRow> = if let Some(agent_type) = agent_type {
            sqlx::query_as("SELECT * FROM agents WHERE agent_type = ? ORDER BY last_seen DESC")
                .bind(agent_type)
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query_as("SELECT * FROM agents ORDER BY last_seen DESC")
                .fetch_all(&self.pool)
                .await?
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn get_statistics(&self) -> DomainResult<StoreStatistics> {
        let (total_contexts,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contexts")
            .fetch_one(&self.pool)
            .await?;
        let (total_messages,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        let (total_conversations,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await?;
        let (total_agents,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM agents")
            .fetch_one(&self.pool)
            .await?;
        let (active_conversations,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;
        let (active_agents,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM agents WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;

        Ok(StoreStatistics {
            total_contexts: total_contexts as u64,
            total_messages: total_messages as u64,
            total_conversations: total_conversations as u64,
            total_agents: total_agents as u64,
            active_conversations: active_conversations as u64,
            active_agents: active_agents as u64,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ContextRow {
    context_id: String,
    context_type: String,
    data: String,
    metadata: Option<String>,
    expires_at: Option<String>,
    created_at: String,
}

impl TryFrom<ContextRow> for ContextData {
    type Error = DomainError;

    fn try_from(row: ContextRow) -> Result<Self, Self::Error> {
        Ok(ContextData {
            context_id: super::parse_uuid(&row.context_id)?,
            context_type: row.context_type,
            data: serde_json::from_str(&row.data)?,
            metadata: super::parse_json_or_default(row.metadata)?,
            expires_at: super::parse_optional_datetime(row.expires_at)?,
            created_at: super::parse_datetime(&row.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    message_id: String,
    message_type: String,
    sender_id: String,
    sender_type: String,
    recipient_id: Option<String>,
    timestamp: String,
    payload: String,
    conversation_id: Option<String>,
    thread_id: Option<String>,
}

impl TryFrom<MessageRow> for StoredMessage {
    type Error = DomainError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let message_type = MessageType::from_str(&row.message_type).ok_or_else(|| {
            DomainError::SerializationError(format!("unknown message type: {}", row.message_type))
        })?;

        Ok(StoredMessage {
            message_id: super::parse_uuid(&row.message_id)?,
            message_type,
            sender_id: row.sender_id,
            sender_type: AgentType::from_str(&row.sender_type).unwrap_or_default(),
            recipient_id: row.recipient_id,
            timestamp: super::parse_datetime(&row.timestamp)?,
            payload: serde_json::from_str(&row.payload)?,
            conversation_id: row.conversation_id,
            thread_id: row.thread_id,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ConversationRow {
    conversation_id: String,
    title: String,
    participants: String,
    created_at: String,
    updated_at: String,
    status: String,
    metadata: Option<String>,
    threads: Option<String>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = DomainError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Conversation {
            conversation_id: row.conversation_id,
            title: row.title,
            participants: serde_json::from_str(&row.participants)?,
            created_at: super::parse_datetime(&row.created_at)?,
            updated_at: super::parse_datetime(&row.updated_at)?,
            status: ConversationStatus::from_str(&row.status).unwrap_or_default(),
            metadata: super::parse_json_or_default(row.metadata)?,
            threads: super::parse_json_or_default(row.threads)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AgentRow {
    agent_id: String,
    agent_type: String,
    name: String,
    capabilities: Option<String>,
    status: String,
    last_seen: String,
    metadata: Option<String>,
}

impl TryFrom<AgentRow> for AgentInfo {
    type Error = DomainError;

    fn try_from(row: AgentRow) -> Result<Self, Self::Error> {
        Ok(AgentInfo {
            agent_id: row.agent_id,
            agent_type: AgentType::from_str(&row.agent_type).unwrap_or_default(),
            name: row.name,
            capabilities: super::parse_json_or_default(row.capabilities)?,
            status: row.status,
            last_seen: super::parse_datetime(&row.last_seen)?,
            metadata: super::parse_json_or_default(row.metadata)?,
        })
    }
}

//! MCP wire protocol: message envelope, typed payloads, and responses.
//!
//! The wire format is a single JSON object per message. The `type` field
//! selects the payload variant and `payload` carries its fields, so the
//! envelope round-trips through serde without any hand-rolled mapping code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// MCP message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    ContextShare,
    ConversationStart,
    ConversationMessage,
    ConversationEnd,
    MemoryStore,
    MemoryRetrieve,
    AgentRegister,
    AgentStatus,
    SystemBroadcast,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextShare => "context_share",
            Self::ConversationStart => "conversation_start",
            Self::ConversationMessage => "conversation_message",
            Self::ConversationEnd => "conversation_end",
            Self::MemoryStore => "memory_store",
            Self::MemoryRetrieve => "memory_retrieve",
            Self::AgentRegister => "agent_register",
            Self::AgentStatus => "agent_status",
            Self::SystemBroadcast => "system_broadcast",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "context_share" => Some(Self::ContextShare),
            "conversation_start" => Some(Self::ConversationStart),
            "conversation_message" => Some(Self::ConversationMessage),
            "conversation_end" => Some(Self::ConversationEnd),
            "memory_store" => Some(Self::MemoryStore),
            "memory_retrieve" => Some(Self::MemoryRetrieve),
            "agent_register" => Some(Self::AgentRegister),
            "agent_status" => Some(Self::AgentStatus),
            "system_broadcast" => Some(Self::SystemBroadcast),
            _ => None,
        }
    }
}

/// Agent types participating in the MCP network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    AiProvider,
    Chatbot,
    MonitorAgent,
    Dashboard,
    #[default]
    ExternalClient,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AiProvider => "ai_provider",
            Self::Chatbot => "chatbot",
            Self::MonitorAgent => "monitor_agent",
            Self::Dashboard => "dashboard",
            Self::ExternalClient => "external_client",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ai_provider" => Some(Self::AiProvider),
            "chatbot" => Some(Self::Chatbot),
            "monitor_agent" => Some(Self::MonitorAgent),
            "dashboard" => Some(Self::Dashboard),
            "external_client" => Some(Self::ExternalClient),
            _ => None,
        }
    }
}

/// Typed payload for each message type.
///
/// Adjacently tagged so the wire shape stays `{"type": ..., "payload": {...}}`.
/// An unknown `type` string fails deserialization, which the dispatch
/// boundary converts into a failure response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MessagePayload {
    ContextShare(ContextSharePayload),
    ConversationStart(ConversationStartPayload),
    ConversationMessage(ConversationMessagePayload),
    ConversationEnd(ConversationEndPayload),
    MemoryStore(MemoryStorePayload),
    MemoryRetrieve(MemoryRetrievePayload),
    AgentRegister(AgentRegisterPayload),
    AgentStatus(AgentStatusPayload),
    SystemBroadcast(SystemBroadcastPayload),
}

impl MessagePayload {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::ContextShare(_) => MessageType::ContextShare,
            Self::ConversationStart(_) => MessageType::ConversationStart,
            Self::ConversationMessage(_) => MessageType::ConversationMessage,
            Self::ConversationEnd(_) => MessageType::ConversationEnd,
            Self::MemoryStore(_) => MessageType::MemoryStore,
            Self::MemoryRetrieve(_) => MessageType::MemoryRetrieve,
            Self::AgentRegister(_) => MessageType::AgentRegister,
            Self::AgentStatus(_) => MessageType::AgentStatus,
            Self::SystemBroadcast(_) => MessageType::SystemBroadcast,
        }
    }
}

fn default_context_type() -> String {
    "general".to_string()
}

fn default_agent_status() -> String {
    "active".to_string()
}

const fn default_true() -> bool {
    true
}

/// Payload for `context_share`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextSharePayload {
    #[serde(default = "default_context_type")]
    pub context_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub expires_in_minutes: Option<i64>,
}

/// Payload for `conversation_start`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationStartPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Payload for `conversation_message`; the body is caller-defined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMessagePayload {
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// Payload for `conversation_end`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationEndPayload {
    /// Takes precedence over the envelope's `conversation_id` when set.
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// Payload for `memory_store`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStorePayload {
    #[serde(default = "default_context_type")]
    pub memory_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Payload for `memory_retrieve`; requires one of the two fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRetrievePayload {
    #[serde(default)]
    pub context_id: Option<Uuid>,
    #[serde(default)]
    pub memory_type: Option<String>,
}

/// Payload for `agent_register`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentRegisterPayload {
    #[serde(default)]
    pub agent_type: AgentType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Payload for `agent_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentStatusPayload {
    #[serde(default = "default_agent_status")]
    pub status: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Default for AgentStatusPayload {
    fn default() -> Self {
        Self {
            status: default_agent_status(),
            metadata: Map::new(),
        }
    }
}

/// Payload for `system_broadcast`; the body is caller-defined.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemBroadcastPayload {
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

/// MCP message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpMessage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub sender_id: String,
    #[serde(default)]
    pub sender_type: AgentType,
    /// Absent means broadcast.
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: MessagePayload,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Explicit request correlation id; responses fall back to `id` when absent.
    #[serde(default)]
    pub request_id: Option<Uuid>,
    /// Caller-side hint only; the server always answers.
    #[serde(default = "default_true")]
    pub expects_response: bool,
}

impl McpMessage {
    pub fn new(sender_id: impl Into<String>, sender_type: AgentType, payload: MessagePayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: sender_id.into(),
            sender_type,
            recipient_id: None,
            timestamp: Utc::now(),
            payload,
            conversation_id: None,
            thread_id: None,
            request_id: None,
            expects_response: true,
        }
    }

    pub fn with_recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_thread(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    pub fn message_type(&self) -> MessageType {
        self.payload.message_type()
    }

    /// Correlation id echoed back in the response.
    pub fn correlation_id(&self) -> Uuid {
        self.request_id.unwrap_or(self.id)
    }
}

/// MCP response envelope, addressed back to the requesting sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub sender_id: String,
    #[serde(default)]
    pub sender_type: AgentType,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub request_id: Uuid,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub response_data: Map<String, Value>,
}

impl McpResponse {
    pub fn success(
        sender_id: impl Into<String>,
        recipient_id: Option<String>,
        request_id: Uuid,
        response_data: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: sender_id.into(),
            sender_type: AgentType::MonitorAgent,
            recipient_id,
            timestamp: Utc::now(),
            request_id,
            success: true,
            error_message: None,
            response_data,
        }
    }

    pub fn failure(sender_id: impl Into<String>, request_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: sender_id.into(),
            sender_type: AgentType::MonitorAgent,
            recipient_id: None,
            timestamp: Utc::now(),
            request_id,
            success: false,
            error_message: Some(error.into()),
            response_data: Map::new(),
        }
    }
}

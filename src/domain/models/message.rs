//! Persisted message projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::protocol::{AgentType, McpMessage, MessageType};

/// Persisted copy of a message envelope, keyed by message id and queryable
/// by conversation id in timestamp order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message_id: Uuid,
    pub message_type: MessageType,
    pub sender_id: String,
    pub sender_type: AgentType,
    pub recipient_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Raw payload JSON as it appeared on the wire.
    pub payload: Value,
    pub conversation_id: Option<String>,
    pub thread_id: Option<String>,
}

impl From<&McpMessage> for StoredMessage {
    fn from(message: &McpMessage) -> Self {
        // Extract the payload object from the wire shape rather than
        // re-deriving it per variant.
        let payload = serde_json::to_value(&message.payload)
            .ok()
            .and_then(|v| v.get("payload").cloned())
            .unwrap_or(Value::Object(serde_json::Map::new()));

        Self {
            message_id: message.id,
            message_type: message.message_type(),
            sender_id: message.sender_id.clone(),
            sender_type: message.sender_type,
            recipient_id: message.recipient_id.clone(),
            timestamp: message.timestamp,
            payload,
            conversation_id: message.conversation_id.clone(),
            thread_id: message.thread_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::protocol::{ContextSharePayload, MessagePayload};
    use serde_json::json;

    #[test]
    fn test_projection_captures_payload_fields() {
        let mut data = serde_json::Map::new();
        data.insert("k".to_string(), json!("v"));
        let message = McpMessage::new(
            "agent-a",
            AgentType::Chatbot,
            MessagePayload::ContextShare(ContextSharePayload {
                context_type: "general".to_string(),
                data,
                metadata: serde_json::Map::new(),
                expires_in_minutes: None,
            }),
        )
        .with_conversation("conv-1");

        let stored = StoredMessage::from(&message);
        assert_eq!(stored.message_id, message.id);
        assert_eq!(stored.message_type, MessageType::ContextShare);
        assert_eq!(stored.conversation_id.as_deref(), Some("conv-1"));
        assert_eq!(stored.payload["data"]["k"], json!("v"));
    }
}

//! Shared context domain model.
//!
//! A context is a typed, optionally-expiring blob of data exchanged between
//! agents. Sharing state lives in `metadata` under `shared_with`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key listing the agent ids a context has been shared with.
pub const SHARED_WITH_KEY: &str = "shared_with";

/// Metadata key recording the last time the context was shared.
pub const LAST_SHARED_KEY: &str = "last_shared";

/// Context data shared between agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextData {
    pub context_id: Uuid,
    /// Type tag: general, conversation, system, agent_state, or caller-defined.
    pub context_type: String,
    pub data: Map<String, Value>,
    pub metadata: Map<String, Value>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ContextData {
    pub fn new(context_type: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            context_id: Uuid::new_v4(),
            context_type: context_type.into(),
            data,
            metadata: Map::new(),
            expires_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set an absolute expiry computed from a relative minute count.
    pub fn expires_in_minutes(mut self, minutes: i64) -> Self {
        self.expires_at = Some(Utc::now() + Duration::minutes(minutes));
        self
    }

    /// A context is expired iff `expires_at` is set and in the past.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() > expires_at,
            None => false,
        }
    }

    /// Agent ids this context has been shared with.
    pub fn shared_with(&self) -> Vec<String> {
        self.metadata
            .get(SHARED_WITH_KEY)
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record a share with `agent_id`. Returns false if already shared
    /// (no-op, reported so callers can signal "nothing changed").
    pub fn share_with(&mut self, agent_id: &str) -> bool {
        let mut shared = self.shared_with();
        if shared.iter().any(|id| id == agent_id) {
            return false;
        }
        shared.push(agent_id.to_string());
        self.metadata.insert(
            SHARED_WITH_KEY.to_string(),
            Value::Array(shared.into_iter().map(Value::String).collect()),
        );
        self.metadata.insert(
            LAST_SHARED_KEY.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        true
    }

    pub fn is_shared_with(&self, agent_id: &str) -> bool {
        self.shared_with().iter().any(|id| id == agent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_expiry_never_expires() {
        let context = ContextData::new("general", Map::new());
        assert!(!context.is_expired());
    }

    #[test]
    fn test_future_expiry_not_expired() {
        let context = ContextData::new("general", Map::new()).expires_in_minutes(10);
        assert!(!context.is_expired());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let mut context = ContextData::new("general", Map::new());
        context.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(context.is_expired());
    }

    #[test]
    fn test_share_is_idempotent() {
        let mut context = ContextData::new("general", Map::new());
        assert!(context.share_with("agent-b"));
        assert!(!context.share_with("agent-b"));
        assert_eq!(context.shared_with(), vec!["agent-b".to_string()]);
        assert!(context.is_shared_with("agent-b"));
        assert!(!context.is_shared_with("agent-c"));
    }

    #[test]
    fn test_share_records_timestamp() {
        let mut context = ContextData::new("general", Map::new());
        context.share_with("agent-b");
        assert!(context.metadata.contains_key(LAST_SHARED_KEY));
    }
}

//! Registered agent domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::protocol::AgentType;

/// Information about a registered agent.
///
/// `status` is an open string (active/inactive/busy/error by convention,
/// but callers may set their own values).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Caller-assigned unique id.
    pub agent_id: String,
    pub agent_type: AgentType,
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default = "default_status")]
    pub status: String,
    pub last_seen: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_status() -> String {
    "active".to_string()
}

impl AgentInfo {
    pub fn new(agent_id: impl Into<String>, agent_type: AgentType, name: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_type,
            name: name.into(),
            capabilities: Vec::new(),
            status: default_status(),
            last_seen: Utc::now(),
            metadata: Map::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Update status and stamp `last_seen`, merging any extra metadata.
    pub fn update_status(&mut self, status: impl Into<String>, metadata: Option<Map<String, Value>>) {
        self.status = status.into();
        self.last_seen = Utc::now();
        if let Some(extra) = metadata {
            for (key, value) in extra {
                self.metadata.insert(key, value);
            }
        }
    }
}

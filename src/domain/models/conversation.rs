//! Conversation and thread domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Conversation lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Active,
    Archived,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Individual thread within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationThread {
    pub thread_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default = "default_thread_status")]
    pub status: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

fn default_thread_status() -> String {
    "active".to_string()
}

impl ConversationThread {
    pub fn new(title: impl Into<String>, metadata: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: Uuid::new_v4().to_string(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            status: default_thread_status(),
            metadata,
        }
    }
}

/// Multi-agent conversation container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub conversation_id: String,
    pub title: String,
    /// Ordered, set-like unique agent ids.
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ConversationStatus,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub threads: HashMap<String, ConversationThread>,
}

impl Conversation {
    pub fn new(title: impl Into<String>, participants: Vec<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, participants)
    }

    /// Construct with a caller-supplied id (used when a message references a
    /// conversation that does not exist yet).
    pub fn with_id(
        conversation_id: impl Into<String>,
        title: impl Into<String>,
        participants: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        let mut conversation = Self {
            conversation_id: conversation_id.into(),
            title: title.into(),
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
            status: ConversationStatus::Active,
            metadata: Map::new(),
            threads: HashMap::new(),
        };
        for participant in participants {
            let _ = conversation.add_participant(&participant);
        }
        conversation
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a participant; returns false if already present.
    pub fn add_participant(&mut self, agent_id: &str) -> bool {
        if self.participants.iter().any(|id| id == agent_id) {
            return false;
        }
        self.participants.push(agent_id.to_string());
        self.touch();
        true
    }

    /// Remove a participant; returns false if not present.
    pub fn remove_participant(&mut self, agent_id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|id| id != agent_id);
        if self.participants.len() < before {
            self.touch();
            true
        } else {
            false
        }
    }

    pub fn has_participant(&self, agent_id: &str) -> bool {
        self.participants.iter().any(|id| id == agent_id)
    }

    /// Create a new thread in this conversation.
    pub fn create_thread(&mut self, title: impl Into<String>, metadata: Map<String, Value>) -> &ConversationThread {
        let thread = ConversationThread::new(title, metadata);
        let thread_id = thread.thread_id.clone();
        self.threads.insert(thread_id.clone(), thread);
        self.touch();
        &self.threads[&thread_id]
    }

    pub fn get_thread(&self, thread_id: &str) -> Option<&ConversationThread> {
        self.threads.get(thread_id)
    }

    /// List threads, newest-updated first, optionally filtered by status.
    pub fn list_threads(&self, status: Option<&str>) -> Vec<&ConversationThread> {
        let mut threads: Vec<&ConversationThread> = self
            .threads
            .values()
            .filter(|thread| status.is_none_or(|s| thread.status == s))
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        threads
    }

    pub fn archive(&mut self) {
        self.status = ConversationStatus::Archived;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

//! Statistics reported by the store, the managers, and the server facade.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Row counts from the memory store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_contexts: u64,
    pub total_messages: u64,
    pub total_conversations: u64,
    pub total_agents: u64,
    pub active_conversations: u64,
    pub active_agents: u64,
}

/// Context manager statistics: in-memory view merged with store counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextStatistics {
    pub active_contexts: usize,
    pub registered_agents: usize,
    /// Registered agent counts broken down by agent type.
    pub agent_types: HashMap<String, usize>,
    #[serde(flatten)]
    pub store: StoreStatistics,
}

/// Conversation manager statistics.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConversationStatistics {
    pub active_conversations: usize,
    /// Summed across active conversations, not deduplicated.
    pub total_participants: usize,
    pub total_threads: usize,
    pub stored_conversations: u64,
    pub stored_messages: u64,
}

/// Server identity block included in the facade's statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
    pub agent_id: String,
    pub subscribers: usize,
}

/// Top-level statistics returned by the server facade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatistics {
    pub server_info: ServerInfo,
    pub contexts: ContextStatistics,
    pub conversations: ConversationStatistics,
}

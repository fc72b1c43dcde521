//! Context and agent registry management.
//!
//! Holds an in-memory cache in front of the memory store. Reads are
//! cache-first with read-through; on conflict the cache entry wins for its
//! id. Persistence is best-effort: store failures are logged and the cached
//! state keeps serving.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::{AgentInfo, ContextData, ContextStatistics, StoreStatistics};
use crate::domain::ports::MemoryStore;

/// Context type tags scanned when collecting everything visible to an agent.
const AGENT_CONTEXT_TYPES: [&str; 4] = ["general", "conversation", "system", "agent_state"];

pub struct ContextManager<S: MemoryStore> {
    store: Arc<S>,
    contexts: RwLock<HashMap<Uuid, ContextData>>,
    agents: RwLock<HashMap<String, AgentInfo>>,
}

impl<S: MemoryStore> ContextManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            contexts: RwLock::new(HashMap::new()),
            agents: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or re-register) an agent. Re-registration overwrites the
    /// previous record wholesale.
    pub async fn register_agent(&self, agent: AgentInfo) -> AgentInfo {
        self.agents
            .write()
            .await
            .insert(agent.agent_id.clone(), agent.clone());

        if let Err(error) = self.store.store_agent(&agent).await {
            warn!(agent_id = %agent.agent_id, %error, "failed to persist agent registration");
        }
        debug!(agent_id = %agent.agent_id, agent_type = %agent.agent_type.as_str(), "agent registered");

        agent
    }

    /// Remove an agent from the registry and the store. Returns false when
    /// the agent was not known to either.
    pub async fn unregister_agent(&self, agent_id: &str) -> bool {
        let cached = self.agents.write().await.remove(agent_id).is_some();

        let stored = match self.store.delete_agent(agent_id).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(%agent_id, %error, "failed to delete agent from store");
                false
            }
        };

        cached || stored
    }

    /// Update an agent's status and merge metadata. Returns false when the
    /// agent is unknown.
    pub async fn update_agent_status(
        &self,
        agent_id: &str,
        status: &str,
        metadata: Map<String, Value>,
    ) -> bool {
        let Some(mut agent) = self.get_agent(agent_id).await else {
            return false;
        };

        agent.update_status(status, Some(metadata));
        self.agents
            .write()
            .await
            .insert(agent_id.to_string(), agent.clone());

        if let Err(error) = self.store.store_agent(&agent).await {
            warn!(%agent_id, %error, "failed to persist agent status update");
        }

        true
    }

    /// Look up an agent, cache first, falling back to the store.
    pub async fn get_agent(&self, agent_id: &str) -> Option<AgentInfo> {
        if let Some(agent) = self.agents.read().await.get(agent_id) {
            return Some(agent.clone());
        }

        match self.store.get_agent(agent_id).await {
            Ok(Some(agent)) => {
                self.agents
                    .write()
                    .await
                    .insert(agent_id.to_string(), agent.clone());
                Some(agent)
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%agent_id, %error, "failed to load agent from store");
                None
            }
        }
    }

    /// List agents, merging the store view with the cache (cache wins per
    /// id), newest-seen first. Optional filters on type and status.
    pub async fn list_agents(
        &self,
        agent_type: Option<&str>,
        status: Option<&str>,
    ) -> Vec<AgentInfo> {
        let mut merged: HashMap<String, AgentInfo> = HashMap::new();

        match self.store.list_agents(agent_type).await {
            Ok(agents) => {
                for agent in agents {
                    merged.insert(agent.agent_id.clone(), agent);
                }
            }
            Err(error) => warn!(%error, "failed to list agents from store"),
        }

        for agent in self.agents.read().await.values() {
            if agent_type.is_none_or(|t| agent.agent_type.as_str() == t) {
                merged.insert(agent.agent_id.clone(), agent.clone());
            }
        }

        let mut agents: Vec<AgentInfo> = merged
            .into_values()
            .filter(|agent| status.is_none_or(|s| agent.status == s))
            .collect();
        agents.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        agents
    }

    /// Create a context and persist it best-effort. The returned context is
    /// authoritative even if the store write failed.
    pub async fn store_context(
        &self,
        context_type: &str,
        data: Map<String, Value>,
        metadata: Map<String, Value>,
        expires_in_minutes: Option<i64>,
    ) -> ContextData {
        let mut context = ContextData::new(context_type, data).with_metadata(metadata);
        if let Some(minutes) = expires_in_minutes {
            context = context.expires_in_minutes(minutes);
        }

        self.insert_context(context.clone()).await;
        context
    }

    /// Look up a context by id. Expired entries are evicted from the cache
    /// and deleted from the store as a side effect.
    pub async fn retrieve_context(&self, context_id: Uuid) -> Option<ContextData> {
        let cached = self.contexts.read().await.get(&context_id).cloned();
        if let Some(context) = cached {
            if !context.is_expired() {
                return Some(context);
            }
            self.evict_context(context_id).await;
            return None;
        }

        match self.store.retrieve_context(context_id).await {
            Ok(Some(context)) => {
                self.contexts
                    .write()
                    .await
                    .insert(context_id, context.clone());
                Some(context)
            }
            Ok(None) => None,
            Err(error) => {
                warn!(%context_id, %error, "failed to load context from store");
                None
            }
        }
    }

    /// All live contexts carrying the given type tag, newest-created first.
    pub async fn retrieve_contexts_by_type(&self, context_type: &str) -> Vec<ContextData> {
        let mut merged: HashMap<Uuid, ContextData> = HashMap::new();

        match self.store.retrieve_contexts_by_type(context_type).await {
            Ok(contexts) => {
                for context in contexts {
                    merged.insert(context.context_id, context);
                }
            }
            Err(error) => warn!(%context_type, %error, "failed to load contexts from store"),
        }

        let mut expired = Vec::new();
        for context in self.contexts.read().await.values() {
            if context.context_type != context_type {
                continue;
            }
            if context.is_expired() {
                expired.push(context.context_id);
            } else {
                merged.insert(context.context_id, context.clone());
            }
        }
        for context_id in expired {
            merged.remove(&context_id);
            self.evict_context(context_id).await;
        }

        let mut contexts: Vec<ContextData> = merged.into_values().collect();
        contexts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        contexts
    }

    /// Hard delete. Returns false when neither cache nor store knew the id.
    pub async fn delete_context(&self, context_id: Uuid) -> bool {
        let cached = self.contexts.write().await.remove(&context_id).is_some();

        let stored = match self.store.delete_context(context_id).await {
            Ok(removed) => removed,
            Err(error) => {
                warn!(%context_id, %error, "failed to delete context from store");
                false
            }
        };

        cached || stored
    }

    /// Share a context with a registered agent. Returns false when the
    /// context is missing or expired, the agent is unknown, or the context
    /// was already shared with that agent.
    pub async fn share_context_with_agent(&self, context_id: Uuid, agent_id: &str) -> bool {
        if self.get_agent(agent_id).await.is_none() {
            debug!(%context_id, %agent_id, "share rejected: unknown agent");
            return false;
        }
        let Some(mut context) = self.retrieve_context(context_id).await else {
            debug!(%context_id, %agent_id, "share rejected: unknown context");
            return false;
        };

        if !context.share_with(agent_id) {
            return false;
        }

        self.insert_context(context).await;
        true
    }

    /// Every live context shared with the given agent, across all standard
    /// context types.
    pub async fn get_agent_contexts(&self, agent_id: &str) -> Vec<ContextData> {
        let mut contexts = Vec::new();
        for context_type in AGENT_CONTEXT_TYPES {
            for context in self.retrieve_contexts_by_type(context_type).await {
                if context.is_shared_with(agent_id) {
                    contexts.push(context);
                }
            }
        }
        contexts
    }

    /// Create the backing context for a conversation: never expires, shared
    /// with every participant up front.
    pub async fn create_conversation_context(
        &self,
        conversation_id: &str,
        participants: &[String],
    ) -> ContextData {
        let mut data = Map::new();
        data.insert("conversation_id".to_string(), json!(conversation_id));
        data.insert("participants".to_string(), json!(participants));

        let mut context = ContextData::new("conversation", data);
        for participant in participants {
            context.share_with(participant);
        }

        self.insert_context(context.clone()).await;
        context
    }

    /// Merge new data into the conversation context matching the given
    /// conversation id. Returns false when no such context exists.
    pub async fn update_conversation_context(
        &self,
        conversation_id: &str,
        data: Map<String, Value>,
    ) -> bool {
        let contexts = self.retrieve_contexts_by_type("conversation").await;
        let Some(mut context) = contexts.into_iter().find(|context| {
            context
                .data
                .get("conversation_id")
                .and_then(Value::as_str)
                .is_some_and(|id| id == conversation_id)
        }) else {
            return false;
        };

        for (key, value) in data {
            context.data.insert(key, value);
        }
        self.insert_context(context).await;
        true
    }

    /// Drop every expired context from the cache and the store. Returns the
    /// total number of distinct contexts removed.
    pub async fn cleanup_expired_contexts(&self) -> u64 {
        let expired: Vec<Uuid> = self
            .contexts
            .read()
            .await
            .values()
            .filter(|context| context.is_expired())
            .map(|context| context.context_id)
            .collect();

        let evicted = expired.len() as u64;
        for context_id in expired {
            self.evict_context(context_id).await;
        }

        // Rows already deleted above are gone, so the bulk sweep only counts
        // expired rows the cache never held.
        let swept = match self.store.cleanup_expired_contexts().await {
            Ok(count) => count,
            Err(error) => {
                warn!(%error, "failed to sweep expired contexts from store");
                0
            }
        };

        evicted + swept
    }

    pub async fn get_statistics(&self) -> ContextStatistics {
        let active_contexts = self
            .contexts
            .read()
            .await
            .values()
            .filter(|context| !context.is_expired())
            .count();

        let agents = self.agents.read().await;
        let mut agent_types: HashMap<String, usize> = HashMap::new();
        for agent in agents.values() {
            *agent_types
                .entry(agent.agent_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let store = match self.store.get_statistics().await {
            Ok(stats) => stats,
            Err(error) => {
                warn!(%error, "failed to read store statistics");
                StoreStatistics::default()
            }
        };

        ContextStatistics {
            active_contexts,
            registered_agents: agents.len(),
            agent_types,
            store,
        }
    }

    async fn insert_context(&self, context: ContextData) {
        if let Err(error) = self.store.store_context(&context).await {
            warn!(context_id = %context.context_id, %error, "failed to persist context");
        }
        self.contexts
            .write()
            .await
            .insert(context.context_id, context);
    }

    async fn evict_context(&self, context_id: Uuid) {
        self.contexts.write().await.remove(&context_id);
        if let Err(error) = self.store.delete_context(context_id).await {
            warn!(%context_id, %error, "failed to delete expired context from store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, SqliteMemoryStore};
    use crate::domain::models::AgentType;
    use chrono::{Duration, Utc};

    async fn setup_manager() -> ContextManager<SqliteMemoryStore> {
        let pool = create_migrated_test_pool().await.unwrap();
        ContextManager::new(Arc::new(SqliteMemoryStore::new(pool)))
    }

    #[tokio::test]
    async fn test_store_and_retrieve_context() {
        let manager = setup_manager().await;
        let context = manager
            .store_context("general", Map::new(), Map::new(), None)
            .await;

        let retrieved = manager.retrieve_context(context.context_id).await.unwrap();
        assert_eq!(retrieved.context_id, context.context_id);
        assert!(retrieved.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_expired_context_is_evicted_everywhere() {
        let manager = setup_manager().await;
        let mut context = manager
            .store_context("general", Map::new(), Map::new(), Some(60))
            .await;

        // Force the cached copy past its expiry.
        context.expires_at = Some(Utc::now() - Duration::minutes(1));
        manager.insert_context(context.clone()).await;

        assert!(manager.retrieve_context(context.context_id).await.is_none());
        // A second lookup hits the store path and still finds nothing.
        assert!(manager.retrieve_context(context.context_id).await.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_context_reads_through_to_store() {
        let pool = create_migrated_test_pool().await.unwrap();
        let store = Arc::new(SqliteMemoryStore::new(pool));

        let warm = ContextManager::new(Arc::clone(&store));
        let context = warm
            .store_context("general", Map::new(), Map::new(), None)
            .await;

        // Fresh manager with a cold cache over the same pool.
        let cold = ContextManager::new(store);
        assert!(cold.retrieve_context(context.context_id).await.is_some());
    }

    #[tokio::test]
    async fn test_share_requires_known_agent_and_context() {
        let manager = setup_manager().await;
        let context = manager
            .store_context("general", Map::new(), Map::new(), None)
            .await;

        assert!(!manager.share_context_with_agent(context.context_id, "ghost").await);

        manager
            .register_agent(AgentInfo::new("agent-b", AgentType::Chatbot, "B"))
            .await;
        assert!(!manager.share_context_with_agent(Uuid::new_v4(), "agent-b").await);

        assert!(manager.share_context_with_agent(context.context_id, "agent-b").await);
        // Second share of the same pair is a no-op.
        assert!(!manager.share_context_with_agent(context.context_id, "agent-b").await);
    }

    #[tokio::test]
    async fn test_get_agent_contexts_spans_types() {
        let manager = setup_manager().await;
        manager
            .register_agent(AgentInfo::new("agent-b", AgentType::Chatbot, "B"))
            .await;

        let general = manager
            .store_context("general", Map::new(), Map::new(), None)
            .await;
        let system = manager
            .store_context("system", Map::new(), Map::new(), None)
            .await;
        manager
            .store_context("general", Map::new(), Map::new(), None)
            .await;

        manager.share_context_with_agent(general.context_id, "agent-b").await;
        manager.share_context_with_agent(system.context_id, "agent-b").await;

        let visible = manager.get_agent_contexts("agent-b").await;
        assert_eq!(visible.len(), 2);
    }

    #[tokio::test]
    async fn test_conversation_context_shared_with_participants() {
        let manager = setup_manager().await;
        let participants = vec!["a".to_string(), "b".to_string()];
        let context = manager
            .create_conversation_context("conv-1", &participants)
            .await;

        assert!(context.expires_at.is_none());
        assert!(context.is_shared_with("a"));
        assert!(context.is_shared_with("b"));

        let mut update = Map::new();
        update.insert("last_message".to_string(), json!("hello"));
        assert!(manager.update_conversation_context("conv-1", update).await);
        assert!(!manager.update_conversation_context("conv-404", Map::new()).await);

        let refreshed = manager.retrieve_context(context.context_id).await.unwrap();
        assert_eq!(refreshed.data.get("last_message"), Some(&json!("hello")));
    }

    #[tokio::test]
    async fn test_cleanup_counts_every_expired_context_once() {
        let manager = setup_manager().await;

        for _ in 0..2 {
            let mut context = manager
                .store_context("general", Map::new(), Map::new(), Some(60))
                .await;
            context.expires_at = Some(Utc::now() - Duration::minutes(1));
            manager.insert_context(context).await;
        }
        manager
            .store_context("general", Map::new(), Map::new(), None)
            .await;

        assert_eq!(manager.cleanup_expired_contexts().await, 2);
        assert_eq!(manager.cleanup_expired_contexts().await, 0);
    }

    #[tokio::test]
    async fn test_agent_lifecycle() {
        let manager = setup_manager().await;
        manager
            .register_agent(AgentInfo::new("agent-a", AgentType::AiProvider, "A"))
            .await;

        assert!(manager.update_agent_status("agent-a", "busy", Map::new()).await);
        assert!(!manager.update_agent_status("ghost", "busy", Map::new()).await);

        let agent = manager.get_agent("agent-a").await.unwrap();
        assert_eq!(agent.status, "busy");

        assert!(manager.unregister_agent("agent-a").await);
        assert!(!manager.unregister_agent("agent-a").await);
        assert!(manager.get_agent("agent-a").await.is_none());
    }

    #[tokio::test]
    async fn test_list_agents_filters_and_orders() {
        let manager = setup_manager().await;
        manager
            .register_agent(AgentInfo::new("old", AgentType::Chatbot, "Old"))
            .await;
        manager
            .register_agent(AgentInfo::new("new", AgentType::Chatbot, "New"))
            .await;
        manager
            .register_agent(AgentInfo::new("dash", AgentType::Dashboard, "Dash"))
            .await;
        manager.update_agent_status("dash", "stopped", Map::new()).await;

        let chatbots = manager.list_agents(Some("chatbot"), None).await;
        assert_eq!(chatbots.len(), 2);

        let active = manager.list_agents(None, Some("active")).await;
        assert_eq!(active.len(), 2);

        let all = manager.list_agents(None, None).await;
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_statistics_reflect_cache_and_store() {
        let manager = setup_manager().await;
        manager
            .register_agent(AgentInfo::new("a", AgentType::Chatbot, "A"))
            .await;
        manager
            .register_agent(AgentInfo::new("b", AgentType::Dashboard, "B"))
            .await;
        manager
            .store_context("general", Map::new(), Map::new(), None)
            .await;

        let stats = manager.get_statistics().await;
        assert_eq!(stats.active_contexts, 1);
        assert_eq!(stats.registered_agents, 2);
        assert_eq!(stats.agent_types.get("chatbot"), Some(&1));
        assert_eq!(stats.store.total_agents, 2);
        assert_eq!(stats.store.total_contexts, 1);
    }
}

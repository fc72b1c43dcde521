//! Integration tests for the SQLite memory store, exercised through the
//! MemoryStore port the way the managers use it.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Map};

use synapse::adapters::sqlite::{create_migrated_test_pool, SqliteMemoryStore};
use synapse::domain::models::{AgentInfo, AgentType, ContextData, Conversation};
use synapse::domain::ports::MemoryStore;
use synapse::services::ContextManager;

async fn setup_store() -> SqliteMemoryStore {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test database");
    SqliteMemoryStore::new(pool)
}

fn context_expiring_in(minutes: i64) -> ContextData {
    let mut context = ContextData::new("general", Map::new());
    context.expires_at = Some(Utc::now() + Duration::minutes(minutes));
    context
}

#[tokio::test]
async fn test_expiry_is_monotonic_under_retrieval() {
    let store = setup_store().await;

    let live = context_expiring_in(60);
    let expired = context_expiring_in(-1);
    store.store_context(&live).await.unwrap();
    store.store_context(&expired).await.unwrap();

    // The expired context never comes back, no matter how often we ask.
    for _ in 0..3 {
        assert!(store.retrieve_context(expired.context_id).await.unwrap().is_none());
        assert!(store.retrieve_context(live.context_id).await.unwrap().is_some());
    }
}

#[tokio::test]
async fn test_cleanup_removes_exactly_the_expired() {
    let store = setup_store().await;

    for _ in 0..3 {
        store.store_context(&context_expiring_in(60)).await.unwrap();
    }
    for _ in 0..2 {
        store.store_context(&context_expiring_in(-5)).await.unwrap();
    }

    assert_eq!(store.cleanup_expired_contexts().await.unwrap(), 2);
    assert_eq!(store.cleanup_expired_contexts().await.unwrap(), 0);

    let remaining = store.retrieve_contexts_by_type("general").await.unwrap();
    assert_eq!(remaining.len(), 3);
}

#[tokio::test]
async fn test_contexts_without_expiry_survive_cleanup() {
    let store = setup_store().await;

    let immortal = ContextData::new("system", Map::new());
    store.store_context(&immortal).await.unwrap();

    assert_eq!(store.cleanup_expired_contexts().await.unwrap(), 0);
    assert!(store.retrieve_context(immortal.context_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_manager_cache_survives_store_loss_of_nothing() {
    // A manager built over the same pool as a direct store handle sees
    // writes made through either path.
    let pool = create_migrated_test_pool().await.unwrap();
    let store = Arc::new(SqliteMemoryStore::new(pool));
    let manager = ContextManager::new(Arc::clone(&store));

    let direct = ContextData::new("general", Map::new());
    store.store_context(&direct).await.unwrap();

    let via_manager = manager.retrieve_context(direct.context_id).await.unwrap();
    assert_eq!(via_manager.context_id, direct.context_id);
}

#[tokio::test]
async fn test_conversation_participant_filter_is_exact() {
    let store = setup_store().await;

    // "agent-1" must not match a conversation containing only "agent-10".
    store
        .store_conversation(&Conversation::new("ten", vec!["agent-10".to_string()]))
        .await
        .unwrap();
    store
        .store_conversation(&Conversation::new("one", vec!["agent-1".to_string()]))
        .await
        .unwrap();

    let matches = store.list_conversations(Some("agent-1"), 50).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].title, "one");
}

#[tokio::test]
async fn test_agent_upsert_replaces_record() {
    let store = setup_store().await;

    let agent = AgentInfo::new("agent-a", AgentType::Chatbot, "Agent A");
    store.store_agent(&agent).await.unwrap();

    let mut updated = agent.clone();
    updated.update_status("error", None);
    updated.metadata.insert("reason".to_string(), json!("timeout"));
    store.store_agent(&updated).await.unwrap();

    let loaded = store.get_agent("agent-a").await.unwrap().unwrap();
    assert_eq!(loaded.status, "error");
    assert_eq!(loaded.metadata.get("reason"), Some(&json!("timeout")));

    let stats = store.get_statistics().await.unwrap();
    assert_eq!(stats.total_agents, 1);
    assert_eq!(stats.active_agents, 0);
}

//! End-to-end tests driving the server facade through raw JSON messages,
//! the way a stdio client would.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use synapse::adapters::sqlite::{create_migrated_test_pool, SqliteMemoryStore};
use synapse::services::McpServer;

async fn setup_server() -> McpServer<SqliteMemoryStore> {
    let pool = create_migrated_test_pool()
        .await
        .expect("failed to create test database");
    let server = McpServer::new(Arc::new(SqliteMemoryStore::new(pool)), "mcp_server", 16);
    server.start().await;
    server
}

fn envelope(sender: &str, message_type: &str, payload: Value) -> Value {
    json!({
        "sender_id": sender,
        "type": message_type,
        "payload": payload
    })
}

#[tokio::test]
async fn test_every_message_type_gets_a_response() {
    let server = setup_server().await;

    // Register first so agent_status succeeds.
    let registered = server
        .process_message(envelope("agent-a", "agent_register", json!({"agent_type": "chatbot"})))
        .await;
    assert!(registered.success);

    let conversation = server
        .process_message(envelope("agent-a", "conversation_start", json!({})))
        .await;
    assert!(conversation.success);
    let conversation_id = conversation.response_data["conversation_id"]
        .as_str()
        .unwrap()
        .to_string();

    let cases = vec![
        ("context_share", json!({"data": {"k": "v"}})),
        ("memory_store", json!({"memory_type": "general", "data": {}})),
        ("memory_retrieve", json!({"memory_type": "general"})),
        ("agent_status", json!({"status": "busy"})),
        ("system_broadcast", json!({"note": "hi"})),
        ("conversation_end", json!({"conversation_id": conversation_id})),
    ];

    for (message_type, payload) in cases {
        let response = server
            .process_message(envelope("agent-a", message_type, payload))
            .await;
        assert!(
            response.success,
            "{message_type} should succeed: {:?}",
            response.error_message
        );
        assert_eq!(response.sender_id, "mcp_server");
        assert_eq!(response.recipient_id.as_deref(), Some("agent-a"));
    }

    // conversation_message threads via the envelope-level conversation id,
    // and is acknowledged even without one.
    for body in [
        json!({
            "sender_id": "agent-a",
            "conversation_id": "conv-x",
            "type": "conversation_message",
            "payload": {"text": "hello"}
        }),
        json!({
            "sender_id": "agent-a",
            "type": "conversation_message",
            "payload": {"text": "unthreaded"}
        }),
    ] {
        let response = server.process_message(body).await;
        assert!(response.success);
    }
}

#[tokio::test]
async fn test_conversation_message_updates_conversation_context() {
    let server = setup_server().await;

    let started = server
        .process_message(envelope(
            "agent-a",
            "conversation_start",
            json!({"participants": ["agent-b"]}),
        ))
        .await;
    let conversation_id = started.response_data["conversation_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = server
        .process_message(json!({
            "sender_id": "agent-b",
            "conversation_id": conversation_id,
            "type": "conversation_message",
            "payload": {"text": "ping"}
        }))
        .await;
    assert!(response.success);

    let context = server
        .get_contexts(Some("conversation"))
        .await
        .into_iter()
        .find(|c| c.data.get("conversation_id") == Some(&json!(conversation_id)))
        .expect("conversation context should exist");
    assert_eq!(
        context.data.get("last_message_from"),
        Some(&json!("agent-b"))
    );
    assert!(context.data.get("last_message_at").is_some());
}

#[tokio::test]
async fn test_unknown_type_and_garbage_input_fail_cleanly() {
    let server = setup_server().await;

    let response = server
        .process_message(envelope("agent-a", "time_travel", json!({})))
        .await;
    assert!(!response.success);
    assert!(response.error_message.unwrap().contains("Invalid message"));

    let response = server.process_message(json!("not an object")).await;
    assert!(!response.success);

    let response = server.process_message(Value::Null).await;
    assert!(!response.success);
}

#[tokio::test]
async fn test_share_then_retrieve_across_agents() {
    let server = setup_server().await;

    server
        .process_message(envelope("agent-b", "agent_register", json!({"agent_type": "dashboard"})))
        .await;

    let shared = server
        .process_message(json!({
            "sender_id": "agent-a",
            "recipient_id": "agent-b",
            "type": "context_share",
            "payload": {
                "context_type": "system",
                "data": {"deploy": "v42"},
                "expires_in_minutes": 60
            }
        }))
        .await;
    assert!(shared.success);
    let context_id = shared.response_data["context_id"].as_str().unwrap();

    // agent-b sees it both by id and through its shared-context listing.
    let retrieved = server
        .process_message(envelope("agent-b", "memory_retrieve", json!({"context_id": context_id})))
        .await;
    assert!(retrieved.success);
    let context = &retrieved.response_data["context"];
    assert_eq!(context["data"]["deploy"], json!("v42"));
    assert!(context["metadata"]["shared_with"]
        .as_array()
        .unwrap()
        .contains(&json!("agent-b")));

    let visible = server.get_agent_contexts("agent-b").await;
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].context_id, Uuid::parse_str(context_id).unwrap());
}

#[tokio::test]
async fn test_conversation_threading_auto_creation() {
    let server = setup_server().await;

    // Two messages referencing the same unseen conversation id end up in one
    // conversation with the referenced id.
    for sender in ["agent-a", "agent-b"] {
        let response = server
            .process_message(json!({
                "sender_id": sender,
                "conversation_id": "conv-shared",
                "type": "conversation_message",
                "payload": {"from": sender}
            }))
            .await;
        assert!(response.success);
    }

    let conversation = server.get_conversation("conv-shared").await.unwrap();
    assert_eq!(conversation.conversation_id, "conv-shared");
    assert!(conversation.has_participant("agent-a"));
    assert!(conversation.has_participant("agent-b"));
    assert_eq!(conversation.title, "Conversation with agent-a");

    let messages = server.get_conversation_messages("conv-shared", None).await;
    assert_eq!(messages.len(), 2);
    assert!(messages[0].timestamp <= messages[1].timestamp);
}

#[tokio::test]
async fn test_statistics_consistency() {
    let server = setup_server().await;

    for agent in ["a", "b", "c"] {
        server
            .process_message(envelope(agent, "agent_register", json!({"agent_type": "chatbot"})))
            .await;
    }

    server
        .process_message(envelope("a", "conversation_start", json!({"participants": ["b"]})))
        .await;
    server
        .process_message(envelope("b", "conversation_start", json!({"participants": ["c"]})))
        .await;

    let stats = server.get_statistics().await;
    // Three registered agents plus the server's own record.
    assert_eq!(stats.contexts.registered_agents, 4);
    assert_eq!(stats.contexts.agent_types.get("chatbot"), Some(&3));
    assert_eq!(stats.contexts.agent_types.get("monitor_agent"), Some(&1));
    assert_eq!(stats.conversations.active_conversations, 2);
    assert_eq!(stats.conversations.total_participants, 4);
    assert_eq!(stats.contexts.store.total_agents, 4);
    assert_eq!(stats.contexts.store.active_conversations, 2);
}

#[tokio::test]
async fn test_broadcast_fan_out() {
    let server = setup_server().await;

    let mut receivers = vec![server.subscribe(), server.subscribe(), server.subscribe()];

    let response = server
        .process_message(envelope("agent-a", "system_broadcast", json!({"alert": "restart"})))
        .await;
    assert!(response.success);
    assert_eq!(response.response_data["recipients"], json!(3));

    for receiver in &mut receivers {
        let message = receiver.recv().await.unwrap();
        assert_eq!(message.sender_id, "agent-a");
    }
}

#[tokio::test]
async fn test_unregistered_agent_status_fails_but_register_recovers() {
    let server = setup_server().await;

    let response = server
        .process_message(envelope("agent-x", "agent_status", json!({"status": "busy"})))
        .await;
    assert!(!response.success);

    server
        .process_message(envelope("agent-x", "agent_register", json!({"agent_type": "monitor_agent"})))
        .await;

    let response = server
        .process_message(envelope("agent-x", "agent_status", json!({"status": "busy"})))
        .await;
    assert!(response.success);
}

use anyhow::Result;

/// Handle the stats command.
pub async fn execute(config_path: Option<&str>, json: bool) -> Result<()> {
    let (_, server) = super::build_server(config_path).await?;
    let stats = server.get_statistics().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("\nServer:");
        println!("  Version:              {}", stats.server_info.version);
        println!("  Agent ID:             {}", stats.server_info.agent_id);
        println!("\nStore:");
        println!("  Contexts:             {}", stats.contexts.store.total_contexts);
        println!("  Messages:             {}", stats.contexts.store.total_messages);
        println!(
            "  Conversations:        {} ({} active)",
            stats.contexts.store.total_conversations, stats.contexts.store.active_conversations
        );
        println!(
            "  Agents:               {} ({} active)",
            stats.contexts.store.total_agents, stats.contexts.store.active_agents
        );
        println!("\nConversations:");
        println!(
            "  Stored messages:      {}",
            stats.conversations.stored_messages
        );
        println!(
            "  Stored conversations: {}",
            stats.conversations.stored_conversations
        );
    }

    Ok(())
}

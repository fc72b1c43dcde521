use anyhow::Result;

use crate::cli::output::{format_conversations_table, format_messages_table};
use crate::cli::types::ConversationCommands;

/// Handle conversation inspection commands.
pub async fn execute(
    config_path: Option<&str>,
    command: ConversationCommands,
    json: bool,
) -> Result<()> {
    let (_, server) = super::build_server(config_path).await?;

    match command {
        ConversationCommands::List { participant, limit } => {
            let conversations = server
                .get_conversations(participant.as_deref(), Some(limit))
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&conversations)?);
            } else if conversations.is_empty() {
                println!("No conversations found.");
            } else {
                println!("{}", format_conversations_table(&conversations));
            }
        }

        ConversationCommands::Show { conversation_id } => {
            let conversation = server
                .get_conversation(&conversation_id)
                .await
                .ok_or_else(|| anyhow::anyhow!("Conversation not found: {conversation_id}"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&conversation)?);
            } else {
                println!("\nConversation Details:");
                println!("ID:           {}", conversation.conversation_id);
                println!("Title:        {}", conversation.title);
                println!("Status:       {}", conversation.status.as_str());
                println!("Participants: {}", conversation.participants.join(", "));
                println!("Threads:      {}", conversation.threads.len());
                println!("Created:      {}", conversation.created_at.format("%Y-%m-%d %H:%M:%S"));
                println!("Updated:      {}", conversation.updated_at.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        ConversationCommands::Messages {
            conversation_id,
            limit,
        } => {
            let messages = server
                .get_conversation_messages(&conversation_id, Some(limit))
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&messages)?);
            } else if messages.is_empty() {
                println!("No messages in conversation {conversation_id}.");
            } else {
                println!("{}", format_messages_table(&messages));
            }
        }
    }

    Ok(())
}

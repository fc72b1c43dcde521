//! Table output formatting for CLI commands using comfy-table.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};

use crate::domain::models::{AgentInfo, ContextData, Conversation, StoredMessage};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(columns: &[&str]) -> Vec<Cell> {
    columns
        .iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_len.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

pub fn format_agents_table(agents: &[AgentInfo]) -> String {
    let mut table = base_table();
    table.set_header(header(&["ID", "Type", "Name", "Status", "Capabilities", "Last Seen"]));

    for agent in agents {
        table.add_row(vec![
            Cell::new(&agent.agent_id),
            Cell::new(agent.agent_type.as_str()),
            Cell::new(truncate_text(&agent.name, 30)),
            Cell::new(&agent.status),
            Cell::new(truncate_text(&agent.capabilities.join(", "), 40)),
            Cell::new(agent.last_seen.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    table.to_string()
}

pub fn format_conversations_table(conversations: &[Conversation]) -> String {
    let mut table = base_table();
    table.set_header(header(&["ID", "Title", "Participants", "Status", "Threads", "Updated"]));

    for conversation in conversations {
        table.add_row(vec![
            Cell::new(truncate_text(&conversation.conversation_id, 36)),
            Cell::new(truncate_text(&conversation.title, 40)),
            Cell::new(conversation.participants.len().to_string()),
            Cell::new(conversation.status.as_str()),
            Cell::new(conversation.threads.len().to_string()),
            Cell::new(conversation.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }

    table.to_string()
}

pub fn format_messages_table(messages: &[StoredMessage]) -> String {
    let mut table = base_table();
    table.set_header(header(&["Time", "Type", "Sender", "Recipient", "Payload"]));

    for message in messages {
        let payload = serde_json::to_string(&message.payload).unwrap_or_default();
        table.add_row(vec![
            Cell::new(message.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(message.message_type.as_str()),
            Cell::new(&message.sender_id),
            Cell::new(message.recipient_id.as_deref().unwrap_or("-")),
            Cell::new(truncate_text(&payload, 60)),
        ]);
    }

    table.to_string()
}

pub fn format_contexts_table(contexts: &[ContextData]) -> String {
    let mut table = base_table();
    table.set_header(header(&["ID", "Type", "Shared With", "Created", "Expires"]));

    for context in contexts {
        let expires = context
            .expires_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        table.add_row(vec![
            Cell::new(context.context_id.to_string()),
            Cell::new(&context.context_type),
            Cell::new(truncate_text(&context.shared_with().join(", "), 40)),
            Cell::new(context.created_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(expires),
        ]);
    }

    table.to_string()
}

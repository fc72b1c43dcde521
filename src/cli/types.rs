//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "synapse")]
#[command(about = "Synapse - MCP context and conversation broker", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a configuration file (defaults to .synapse/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the MCP server over stdin/stdout
    Serve,

    /// List registered agents
    Agents {
        /// Filter by agent type
        #[arg(short = 't', long)]
        agent_type: Option<String>,

        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Conversation inspection commands
    #[command(subcommand)]
    Conversations(ConversationCommands),

    /// List stored contexts
    Contexts {
        /// Filter by context type
        #[arg(short = 't', long)]
        context_type: Option<String>,

        /// Show only contexts shared with this agent
        #[arg(short, long)]
        agent: Option<String>,
    },

    /// Show server and store statistics
    Stats,

    /// Delete expired contexts
    Cleanup,
}

#[derive(Subcommand)]
pub enum ConversationCommands {
    /// List conversations
    List {
        /// Filter by participant agent id
        #[arg(short, long)]
        participant: Option<String>,

        /// Maximum number of conversations to display
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show details for a specific conversation
    Show {
        /// Conversation ID
        conversation_id: String,
    },

    /// Show message history for a conversation
    Messages {
        /// Conversation ID
        conversation_id: String,

        /// Maximum number of messages to display
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
}

//! Service layer: managers and the dispatch facade.

pub mod context_manager;
pub mod conversation_manager;
pub mod mcp_server;

pub use context_manager::ContextManager;
pub use conversation_manager::ConversationManager;
pub use mcp_server::McpServer;

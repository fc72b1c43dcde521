//! Domain models for the Synapse broker.

pub mod agent;
pub mod config;
pub mod context;
pub mod conversation;
pub mod message;
pub mod protocol;
pub mod statistics;

pub use agent::AgentInfo;
pub use config::{Config, DatabaseConfig, LoggingConfig, ServerConfig};
pub use context::ContextData;
pub use conversation::{Conversation, ConversationStatus, ConversationThread};
pub use message::StoredMessage;
pub use protocol::{
    AgentRegisterPayload, AgentStatusPayload, AgentType, ContextSharePayload,
    ConversationEndPayload, ConversationMessagePayload, ConversationStartPayload, McpMessage,
    McpResponse, MemoryRetrievePayload, MemoryStorePayload, MessagePayload, MessageType,
    SystemBroadcastPayload,
};
pub use statistics::{
    ContextStatistics, ConversationStatistics, ServerInfo, ServerStatistics, StoreStatistics,
};

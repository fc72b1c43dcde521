//! Domain errors for the Synapse broker.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur in the Synapse system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Context not found: {0}")]
    ContextNotFound(Uuid),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

//! CLI command handlers.

pub mod agents;
pub mod cleanup;
pub mod contexts;
pub mod conversations;
pub mod serve;
pub mod stats;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::sqlite::{initialize_database, SqliteMemoryStore};
use crate::domain::models::Config;
use crate::infrastructure::ConfigLoader;
use crate::services::McpServer;

/// Load config and open the database, building the server facade every
/// command runs against.
pub(crate) async fn build_server(
    config_path: Option<&str>,
) -> Result<(Config, Arc<McpServer<SqliteMemoryStore>>)> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let pool = initialize_database(&config.database.url(), config.database.max_connections)
        .await
        .context("Failed to open database")?;
    let store = Arc::new(SqliteMemoryStore::new(pool));
    let server = Arc::new(McpServer::new(
        store,
        config.server.agent_id.clone(),
        config.server.broadcast_capacity,
    ));

    Ok((config, server))
}

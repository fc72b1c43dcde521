use std::time::Duration;

use anyhow::Result;

use crate::adapters::stdio::StdioTransport;

/// Run the MCP server on stdin/stdout until the peer disconnects.
pub async fn execute(config_path: Option<&str>, _json: bool) -> Result<()> {
    let (config, server) = super::build_server(config_path).await?;

    let cleanup_interval = Duration::from_secs(config.server.cleanup_interval_minutes * 60);
    StdioTransport::new(server, cleanup_interval).run().await
}

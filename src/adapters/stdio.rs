//! Stdio transport: newline-delimited JSON messages on stdin/stdout.
//!
//! One request per line in, one response per line out. Logging goes to
//! stderr (stdout is reserved for protocol messages). A line that fails to
//! parse still gets a failure response, so clients always see an answer.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::domain::ports::MemoryStore;
use crate::services::McpServer;

pub struct StdioTransport<S: MemoryStore + 'static> {
    server: Arc<McpServer<S>>,
    cleanup_interval: Duration,
}

impl<S: MemoryStore + 'static> StdioTransport<S> {
    pub fn new(server: Arc<McpServer<S>>, cleanup_interval: Duration) -> Self {
        Self {
            server,
            cleanup_interval,
        }
    }

    /// Run the transport loop until stdin closes.
    ///
    /// Starts the server, spawns the periodic expired-context sweep, and
    /// stops the server when the peer disconnects.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.server.start().await;
        let sweeper = self.spawn_cleanup_task();

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(stdin).lines();

        info!("stdio transport started");

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let raw: Value = match serde_json::from_str(line) {
                Ok(raw) => raw,
                Err(error) => {
                    warn!(%error, "unparseable input line");
                    Value::Null
                }
            };

            let response = self.server.process_message(raw).await;
            let mut bytes = serde_json::to_vec(&response)?;
            bytes.push(b'\n');
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }

        sweeper.abort();
        self.server.stop().await;
        info!("stdio transport stopped");

        Ok(())
    }

    fn spawn_cleanup_task(&self) -> tokio::task::JoinHandle<()> {
        let server = Arc::clone(&self.server);
        let interval = self.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; start() already swept.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = server.cleanup_expired_contexts().await;
                if removed > 0 {
                    info!(removed, "expired contexts swept");
                }
            }
        })
    }
}

//! Synapse CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use synapse::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Serve => synapse::cli::commands::serve::execute(config, cli.json).await,
        Commands::Agents { agent_type, status } => {
            synapse::cli::commands::agents::execute(config, agent_type, status, cli.json).await
        }
        Commands::Conversations(command) => {
            synapse::cli::commands::conversations::execute(config, command, cli.json).await
        }
        Commands::Contexts {
            context_type,
            agent,
        } => synapse::cli::commands::contexts::execute(config, context_type, agent, cli.json).await,
        Commands::Stats => synapse::cli::commands::stats::execute(config, cli.json).await,
        Commands::Cleanup => synapse::cli::commands::cleanup::execute(config, cli.json).await,
    };

    if let Err(err) = result {
        synapse::cli::handle_error(err, cli.json);
    }
}

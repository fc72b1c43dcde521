use anyhow::Result;

use crate::cli::output::format_contexts_table;

/// Handle the contexts list command.
pub async fn execute(
    config_path: Option<&str>,
    context_type: Option<String>,
    agent: Option<String>,
    json: bool,
) -> Result<()> {
    let (_, server) = super::build_server(config_path).await?;

    let contexts = match agent.as_deref() {
        Some(agent_id) => server.get_agent_contexts(agent_id).await,
        None => server.get_contexts(context_type.as_deref()).await,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&contexts)?);
    } else if contexts.is_empty() {
        println!("No contexts found.");
    } else {
        println!("{}", format_contexts_table(&contexts));
        println!(
            "\nShowing {} context{}",
            contexts.len(),
            if contexts.len() == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

use anyhow::Result;

use crate::cli::output::format_agents_table;

/// Handle the agents list command.
pub async fn execute(
    config_path: Option<&str>,
    agent_type: Option<String>,
    status: Option<String>,
    json: bool,
) -> Result<()> {
    let (_, server) = super::build_server(config_path).await?;
    let agents = server
        .get_agents(agent_type.as_deref(), status.as_deref())
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&agents)?);
    } else if agents.is_empty() {
        println!("No agents registered.");
    } else {
        println!("{}", format_agents_table(&agents));
        println!(
            "\nShowing {} agent{}",
            agents.len(),
            if agents.len() == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

use anyhow::Result;
use serde_json::json;

/// Handle the cleanup command.
pub async fn execute(config_path: Option<&str>, json: bool) -> Result<()> {
    let (_, server) = super::build_server(config_path).await?;
    let removed = server.cleanup_expired_contexts().await;

    if json {
        println!("{}", json!({ "removed": removed }));
    } else {
        println!(
            "Removed {} expired context{}.",
            removed,
            if removed == 1 { "" } else { "s" }
        );
    }

    Ok(())
}

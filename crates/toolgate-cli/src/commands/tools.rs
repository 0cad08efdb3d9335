use colored::Colorize;
use toolgate_core::Config;
use toolgate_tools::ToolGate;

use super::fetch_tools;

/// Prints each remote tool the agent would load, flagging the gated ones.
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.remote_api_key()?;

    let (_, definitions) = fetch_tools(&config).await?;
    let gate = ToolGate::from_config(&config.security);

    if definitions.is_empty() {
        println!("{}", "No tools found.".yellow());
        return Ok(());
    }

    for def in &definitions {
        let marker = if gate.requires_confirmation(&def.name) {
            " (requires confirmation)".yellow().to_string()
        } else {
            String::new()
        };
        println!("{}{}", def.name.cyan().bold(), marker);
        if !def.description.is_empty() {
            println!("    {}", def.description);
        }
    }

    println!("\n{} tools", definitions.len());
    Ok(())
}

use colored::Colorize;
use toolgate_agent::AgentError;
use toolgate_core::Config;

use super::chat::show_response;
use super::{create_agent, process_turn};

pub async fn run(config: Config, system_prompt: Option<String>, message: &str) -> anyhow::Result<()> {
    let agent = create_agent(&config, system_prompt).await?;
    let session = agent.create_session();

    match process_turn(&agent, &session, message).await {
        Ok(response) => show_response(&response, &config.output_dir()),
        Err(AgentError::ToolDenied { tool_name }) => {
            println!("🤖: {}", agent.recover_from_denial(&session, &tool_name));
        }
        Err(AgentError::Cancelled) => println!("{}", "Cancelled.".yellow()),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}

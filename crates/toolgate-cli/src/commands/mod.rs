pub mod chat;
pub mod run;
pub mod tools;

use crate::hooks::ConsoleHooks;
use crate::prompt::DEFAULT_SYSTEM_PROMPT;
use anyhow::Context as _;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolgate_agent::{Agent, AgentConfig, AgentResponse, Session};
use toolgate_core::{Config, ToolDefinition};
use toolgate_llm::OpenAiProvider;
use toolgate_tools::{
    AuthorizationNotifier, RemoteTool, RemoteToolClient, Tool, ToolGate, ToolRegistry,
};
use tracing::info;

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub model: Option<String>,
    pub user_id: Option<String>,
    pub auto_approve: bool,
}

pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_default()?,
    };
    Ok(apply_overrides(config.merge_env(), overrides))
}

fn apply_overrides(mut config: Config, overrides: &Overrides) -> Config {
    if let Some(model) = &overrides.model {
        config.llm.model = Some(model.clone());
    }
    if let Some(user_id) = &overrides.user_id {
        config.remote.user_id = Some(user_id.clone());
    }
    if overrides.auto_approve {
        config.security.auto_approve = true;
    }
    config
}

/// Prints the authorization prompts the remote service asks for.
struct ConsoleAuthNotifier;

impl AuthorizationNotifier for ConsoleAuthNotifier {
    fn pending(&self, tool_name: &str, url: &str) {
        println!("⚙️: Authorization required for tool call {}", tool_name);
        println!("⚙️: Please authorize in your browser {}", url);
        println!("⚙️: Waiting for you to complete authorization...");
    }

    fn granted(&self, _tool_name: &str) {
        println!("⚙️: Authorization granted. Resuming execution...");
    }
}

pub async fn fetch_tools(config: &Config) -> anyhow::Result<(Arc<RemoteToolClient>, Vec<ToolDefinition>)> {
    let client = Arc::new(
        RemoteToolClient::from_config(&config.remote)?.with_notifier(Arc::new(ConsoleAuthNotifier)),
    );
    let remote = &config.remote;
    let definitions = client
        .fetch_tools(&remote.toolkits, &remote.tools, remote.tool_limit)
        .await
        .context("Failed to fetch tools")?;
    Ok((client, definitions))
}

async fn authorize_all(
    client: &RemoteToolClient,
    definitions: &[ToolDefinition],
    user_id: &str,
) -> anyhow::Result<()> {
    for def in definitions {
        client
            .authorize_tool(&def.name, user_id)
            .await
            .with_context(|| format!("Failed to authorize {}", def.name))?;
    }
    Ok(())
}

/// Fetches and authorizes the remote tools, gates the sensitive ones and
/// assembles the agent around them.
pub async fn create_agent(config: &Config, system_prompt: Option<String>) -> anyhow::Result<Agent> {
    config.validate()?;
    let user_id = config.user_id()?.to_string();

    let (client, definitions) = fetch_tools(config).await?;
    authorize_all(&client, &definitions, &user_id).await?;

    let remote_tools: Vec<Arc<dyn Tool>> = definitions
        .into_iter()
        .map(|def| Arc::new(RemoteTool::new(client.clone(), def).with_user(&user_id)) as Arc<dyn Tool>)
        .collect();

    let gate = ToolGate::from_config(&config.security);
    let mut registry = ToolRegistry::new();
    registry.register_all(gate.wrap_all(remote_tools))?;
    info!(
        tools = registry.len(),
        gated = registry.gated_tools().len(),
        "Tool registry ready"
    );

    let mut agent_config = AgentConfig::from_config(config, DEFAULT_SYSTEM_PROMPT)?;
    if let Some(prompt) = system_prompt {
        agent_config.system_prompt = prompt;
    }

    let llm = OpenAiProvider::from_config(&config.llm)?;
    let hooks = ConsoleHooks::new(config.agent.name.clone());

    let agent = Agent::builder()
        .config(agent_config)
        .llm(Arc::new(llm))
        .tool_registry(Arc::new(registry))
        .hooks(Arc::new(hooks))
        .build()
        .context("Failed to create agent")?;

    Ok(agent)
}

/// Runs one turn. Ctrl-C while it runs cancels the turn, not the program.
pub async fn process_turn(
    agent: &Agent,
    session: &Session,
    message: &str,
) -> toolgate_agent::Result<AgentResponse> {
    let token = CancellationToken::new();
    let watcher = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    let result = agent.process_with_cancellation(session, message, token).await;
    watcher.abort();
    result
}

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::executor::Executor;
use crate::hooks::{AgentHooks, NoopHooks};
use crate::response::AgentResponse;
use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;
use toolgate_core::Message;
use toolgate_llm::LlmProvider;
use tokio_util::sync::CancellationToken;
use toolgate_tools::{ToolExecutor, ToolRegistry};
use tracing::info;

/// What the user says, on the record, after refusing a tool call.
pub const DENIAL_USER_REPLY: &str = "I changed my mind, please don't do it!";

pub fn denial_request(tool_name: &str) -> String {
    format!("Please confirm the call to {}", tool_name)
}

pub fn denial_ack(tool_name: &str) -> String {
    format!(
        "Sure, I cancelled the call to {}. What else can I do for you today?",
        tool_name
    )
}

pub struct Agent {
    config: AgentConfig,
    llm: Arc<dyn LlmProvider>,
    tools: Option<Arc<ToolExecutor>>,
    hooks: Arc<dyn AgentHooks>,
}

impl Agent {
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    pub fn tools(&self) -> Option<&ToolRegistry> {
        self.tools.as_ref().map(|t| t.registry())
    }

    pub fn create_session(&self) -> Session {
        Session::new()
    }

    pub async fn chat(&self, session: &Session, message: &str) -> Result<String> {
        let response = self.process(session, message).await?;
        Ok(response.text)
    }

    pub async fn process(&self, session: &Session, message: &str) -> Result<AgentResponse> {
        self.process_with_cancellation(session, message, CancellationToken::new())
            .await
    }

    /// Like [`Agent::process`], but cancelling `token` abandons the turn with
    /// [`AgentError::Cancelled`].
    pub async fn process_with_cancellation(
        &self,
        session: &Session,
        message: &str,
        token: CancellationToken,
    ) -> Result<AgentResponse> {
        let executor = Executor::new(
            self.config.clone(),
            self.llm.clone(),
            self.tools.clone(),
            self.hooks.clone(),
        )
        .with_cancellation(token);
        executor.execute(session, message).await
    }

    /// Rewinds the session to the user message of the abandoned turn and
    /// records the cancellation exchange. Returns the closing assistant line.
    pub fn recover_from_denial(&self, session: &Session, tool_name: &str) -> String {
        if let Some(idx) = session.last_user_index() {
            session.truncate(idx + 1);
        }

        let ack = denial_ack(tool_name);
        session.add_messages([
            Message::assistant(denial_request(tool_name)),
            Message::user(DENIAL_USER_REPLY),
            Message::assistant(&ack),
        ]);

        info!(tool = tool_name, "Recorded cancelled tool call");
        ack
    }
}

#[derive(Default)]
pub struct AgentBuilder {
    config: Option<AgentConfig>,
    name: Option<String>,
    system_prompt: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_iterations: Option<usize>,
    user_id: Option<String>,
    tool_timeout: Option<Duration>,
    llm: Option<Arc<dyn LlmProvider>>,
    tool_registry: Option<Arc<ToolRegistry>>,
    hooks: Option<Arc<dyn AgentHooks>>,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = Some(registry);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn AgentHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let llm = self.llm.ok_or_else(|| AgentError::config("LLM provider is required"))?;

        let mut config = self.config.unwrap_or_default();

        if let Some(name) = self.name {
            config.name = name;
        }
        if let Some(prompt) = self.system_prompt {
            config.system_prompt = prompt;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(temp) = self.temperature {
            config.temperature = Some(temp);
        }
        if let Some(max) = self.max_tokens {
            config.max_tokens = Some(max);
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
        if let Some(user_id) = self.user_id {
            config.user_id = Some(user_id);
        }
        if let Some(timeout) = self.tool_timeout {
            config.tool_timeout_secs = timeout.as_secs();
        }

        if config.model.is_empty() {
            return Err(AgentError::config("model is required"));
        }

        let tool_timeout = config.tool_timeout();
        let tools = self
            .tool_registry
            .map(|registry| Arc::new(ToolExecutor::new(registry).with_timeout(tool_timeout)));
        let hooks = self.hooks.unwrap_or_else(|| Arc::new(NoopHooks));

        Ok(Agent {
            config,
            llm,
            tools,
            hooks,
        })
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;
use toolgate_core::config::Config;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_name")]
    pub name: String,

    pub system_prompt: String,

    pub model: String,

    /// Left unset unless configured; some models reject the parameter.
    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Identity passed to remote tools and to the model provider.
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_name() -> String {
    "assistant".to_string()
}

fn default_max_iterations() -> usize {
    10
}

fn default_max_context_messages() -> usize {
    50
}

fn default_tool_timeout_secs() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            system_prompt: String::new(),
            model: "gpt-4o".to_string(),
            temperature: None,
            max_tokens: None,
            max_iterations: default_max_iterations(),
            max_context_messages: default_max_context_messages(),
            tool_timeout_secs: default_tool_timeout_secs(),
            user_id: None,
        }
    }
}

impl AgentConfig {
    pub fn new(model: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: system_prompt.into(),
            ..Default::default()
        }
    }

    /// Agent settings from the loaded configuration; the prompt falls back to `default_prompt`.
    pub fn from_config(config: &Config, default_prompt: &str) -> toolgate_core::Result<Self> {
        let system_prompt = config
            .agent
            .system_prompt
            .clone()
            .unwrap_or_else(|| default_prompt.to_string());

        Ok(Self {
            name: config.agent.name.clone(),
            system_prompt,
            model: config.model()?.to_string(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            max_iterations: config.agent.max_iterations,
            tool_timeout_secs: config.remote.tool_timeout_secs,
            user_id: config.remote.user_id.clone(),
            ..Default::default()
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_context_messages(mut self, max_messages: usize) -> Self {
        self.max_context_messages = max_messages;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.name, "assistant");
        assert_eq!(config.max_iterations, 10);
        assert!(config.temperature.is_none());
        assert!(config.user_id.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = AgentConfig::new("gpt-4o", "You are helpful.")
            .with_name("analyst")
            .with_temperature(0.5)
            .with_max_iterations(5)
            .with_user("dev@example.com");

        assert_eq!(config.name, "analyst");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, Some(0.5));
        assert_eq!(config.max_iterations, 5);
        assert_eq!(config.user_id.as_deref(), Some("dev@example.com"));
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.llm.model = Some("gpt-4.1".to_string());
        config.remote.user_id = Some("me@example.com".to_string());
        config.agent.max_iterations = 3;

        let agent = AgentConfig::from_config(&config, "default prompt").unwrap();
        assert_eq!(agent.model, "gpt-4.1");
        assert_eq!(agent.system_prompt, "default prompt");
        assert_eq!(agent.max_iterations, 3);
        assert_eq!(agent.user_id.as_deref(), Some("me@example.com"));
        assert_eq!(agent.name, "toolgate");
    }

    #[test]
    fn test_from_config_requires_model() {
        assert!(AgentConfig::from_config(&Config::default(), "prompt").is_err());
    }
}

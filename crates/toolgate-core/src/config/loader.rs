use super::types::{Config, LogLevel};
use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

pub const ENV_USER_ID: &str = "ARCADE_USER_ID";
pub const ENV_REMOTE_API_KEY: &str = "ARCADE_API_KEY";
pub const ENV_REMOTE_BASE_URL: &str = "ARCADE_BASE_URL";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_LLM_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_LLM_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "TOOLGATE_LOG_LEVEL";

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn load_default() -> Result<Self> {
        let paths = [
            "./toolgate.toml",
            "~/.toolgate/config.toml",
            "~/.config/toolgate/config.toml",
        ];

        for path in &paths {
            let expanded = shellexpand::tilde(path);
            let path = Path::new(expanded.as_ref());
            if path.exists() {
                debug!(path = %path.display(), "Loading config file");
                return Self::load_from_file(path);
            }
        }

        Ok(Config::default())
    }

    pub fn merge_env(self) -> Self {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Overlays values from `lookup`; set, non-empty variables win over the file.
    pub fn merge_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(level) = get(ENV_LOG_LEVEL).as_deref().and_then(LogLevel::parse) {
            self.general.log_level = level;
        }
        if let Some(user_id) = get(ENV_USER_ID) {
            self.remote.user_id = Some(user_id);
        }
        if let Some(key) = get(ENV_REMOTE_API_KEY) {
            self.remote.api_key = Some(key);
        }
        if let Some(url) = get(ENV_REMOTE_BASE_URL) {
            self.remote.base_url = url;
        }
        if let Some(model) = get(ENV_MODEL) {
            self.llm.model = Some(model);
        }
        if let Some(key) = get(ENV_LLM_API_KEY) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get(ENV_LLM_BASE_URL) {
            self.llm.base_url = url;
        }

        self
    }

    pub fn user_id(&self) -> Result<&str> {
        self.remote
            .user_id
            .as_deref()
            .ok_or_else(|| Error::missing_config(ENV_USER_ID))
    }

    pub fn model(&self) -> Result<&str> {
        self.llm
            .model
            .as_deref()
            .ok_or_else(|| Error::missing_config(ENV_MODEL))
    }

    pub fn llm_api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .ok_or_else(|| Error::missing_config(ENV_LLM_API_KEY))
    }

    pub fn remote_api_key(&self) -> Result<&str> {
        self.remote
            .api_key
            .as_deref()
            .ok_or_else(|| Error::missing_config(ENV_REMOTE_API_KEY))
    }

    /// Checks every value the chat loop cannot start without.
    pub fn validate(&self) -> Result<()> {
        self.user_id()?;
        self.model()?;
        self.llm_api_key()?;
        self.remote_api_key()?;
        if self.remote.toolkits.is_empty() && self.remote.tools.is_empty() {
            return Err(Error::Config(
                "no toolkits or tools configured under [remote]".to_string(),
            ));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> std::path::PathBuf {
        let expanded = shellexpand::tilde(self.general.output_dir.as_str());
        std::path::PathBuf::from(expanded.as_ref())
    }
}

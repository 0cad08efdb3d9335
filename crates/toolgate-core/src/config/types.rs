use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Where chart images returned by tools are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: Utf8PathBuf,
}

fn default_output_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("./charts")
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout() -> u64 {
    300
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// The hosted tool-execution service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,
    /// Identity that authorizes each tool.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Every tool from these toolkits is fetched.
    #[serde(default = "default_toolkits")]
    pub toolkits: Vec<String>,
    /// Individual tools fetched on top of the toolkits.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default = "default_tool_limit")]
    pub tool_limit: usize,
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_remote_base_url() -> String {
    "https://api.arcade.dev".to_string()
}

fn default_toolkits() -> Vec<String> {
    vec!["E2B".to_string()]
}

fn default_tool_limit() -> usize {
    100
}

fn default_auth_timeout() -> u64 {
    600
}

fn default_tool_timeout() -> u64 {
    120
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_remote_base_url(),
            user_id: None,
            toolkits: default_toolkits(),
            tools: Vec::new(),
            tool_limit: default_tool_limit(),
            auth_timeout_secs: default_auth_timeout(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_agent_name() -> String {
    "toolgate".to_string()
}

fn default_max_iterations() -> usize {
    10
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            system_prompt: None,
            max_iterations: default_max_iterations(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Tools that need a human "yes" before each call.
    #[serde(default = "default_require_confirmation")]
    pub require_confirmation: Vec<String>,
    /// Skips the prompt and approves every gated call.
    #[serde(default)]
    pub auto_approve: bool,
}

fn default_require_confirmation() -> Vec<String> {
    vec![
        "E2b_RunCode".to_string(),
        "E2b_CreateStaticMatplotlibChart".to_string(),
    ]
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            require_confirmation: default_require_confirmation(),
            auto_approve: false,
        }
    }
}

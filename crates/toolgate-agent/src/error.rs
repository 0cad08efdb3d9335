use thiserror::Error;
use toolgate_core::error::Error as CoreError;
use toolgate_llm::LlmError;
use toolgate_tools::ToolError;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Max iterations reached: {0}")]
    MaxIterationsReached(usize),

    /// The user refused a gated tool call; the turn was abandoned.
    #[error("User denied the call to {tool_name}")]
    ToolDenied { tool_name: String },

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool error: {0}")]
    Tool(ToolError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl From<ToolError> for AgentError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Denied { tool_name } => AgentError::ToolDenied { tool_name },
            ToolError::Cancelled => AgentError::Cancelled,
            other => AgentError::Tool(other),
        }
    }
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn denied_tool(&self) -> Option<&str> {
        match self {
            AgentError::ToolDenied { tool_name } => Some(tool_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_converts_to_tool_denied() {
        let err: AgentError = ToolError::denied("E2b_RunCode").into();
        assert_eq!(err.denied_tool(), Some("E2b_RunCode"));
    }

    #[test]
    fn test_other_tool_errors_stay_tool_errors() {
        let err: AgentError = ToolError::not_found("Nope").into();
        assert!(matches!(err, AgentError::Tool(ToolError::NotFound(_))));
        assert!(err.denied_tool().is_none());
    }
}

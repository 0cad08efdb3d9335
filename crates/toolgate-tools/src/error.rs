use thiserror::Error;
use toolgate_core::error::Error as CoreError;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Execution failed: {tool} - {message}")]
    ExecutionFailed { tool: String, message: String },

    /// The user refused a gated call. The tool was not invoked.
    #[error("Tool call denied by user: {tool_name}")]
    Denied { tool_name: String },

    #[error("Authorization failed for {tool}: {message}")]
    Authorization { tool: String, message: String },

    #[error("Remote service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn execution_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn denied(tool_name: impl Into<String>) -> Self {
        Self::Denied {
            tool_name: tool_name.into(),
        }
    }

    pub fn authorization(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authorization {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, ToolError::Denied { .. })
    }

    /// Name of the refused tool, if this is a denial.
    pub fn denied_tool(&self) -> Option<&str> {
        match self {
            ToolError::Denied { tool_name } => Some(tool_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_carries_tool_name() {
        let err = ToolError::denied("E2b_RunCode");
        assert!(err.is_denied());
        assert_eq!(err.denied_tool(), Some("E2b_RunCode"));
        assert_eq!(err.to_string(), "Tool call denied by user: E2b_RunCode");
    }

    #[test]
    fn test_other_errors_are_not_denials() {
        let err = ToolError::execution_failed("E2b_RunCode", "sandbox crashed");
        assert!(!err.is_denied());
        assert!(err.denied_tool().is_none());
    }
}

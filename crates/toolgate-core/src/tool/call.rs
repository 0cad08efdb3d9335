use crate::types::{Metadata, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Pending,
    Running,
    Completed,
    Failed,
    /// A human refused the call; the tool never ran.
    Denied,
}

impl ToolCallStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ToolCallStatus::Completed | ToolCallStatus::Failed | ToolCallStatus::Denied
        )
    }
}

/// Lifecycle record of a single tool invocation requested by the model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, e.g. `call_abc123`.
    pub id: String,
    pub name: String,
    pub input: Value,
    pub status: ToolCallStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
            status: ToolCallStatus::Pending,
            output: None,
            error: None,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            metadata: Metadata::new(),
        }
    }

    pub fn start(&mut self) {
        self.status = ToolCallStatus::Running;
        self.started_at = Some(Timestamp::now());
    }

    pub fn complete(&mut self, output: impl Into<String>) {
        self.status = ToolCallStatus::Completed;
        self.output = Some(output.into());
        self.completed_at = Some(Timestamp::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ToolCallStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Timestamp::now());
    }

    pub fn deny(&mut self) {
        self.status = ToolCallStatus::Denied;
        self.completed_at = Some(Timestamp::now());
    }

    pub fn is_pending(&self) -> bool {
        self.status == ToolCallStatus::Pending
    }

    pub fn is_completed(&self) -> bool {
        self.status == ToolCallStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == ToolCallStatus::Failed
    }

    pub fn is_denied(&self) -> bool {
        self.status == ToolCallStatus::Denied
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn duration_ms(&self) -> Option<u64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end.unix_millis() - start.unix_millis()).max(0) as u64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_call_lifecycle() {
        let mut call = ToolCall::new("call_1", "E2b_RunCode", serde_json::json!({"code": "1+1"}));

        assert!(call.is_pending());
        assert!(!call.is_terminal());

        call.start();
        assert_eq!(call.status, ToolCallStatus::Running);
        assert!(call.started_at.is_some());

        call.complete("2");
        assert!(call.is_completed());
        assert!(call.is_terminal());
        assert_eq!(call.output.as_deref(), Some("2"));
        assert!(call.duration_ms().is_some());
    }

    #[test]
    fn test_tool_call_denied() {
        let mut call = ToolCall::new("call_2", "E2b_RunCode", serde_json::json!({}));

        call.start();
        call.deny();

        assert!(call.is_denied());
        assert!(call.is_terminal());
        assert!(call.output.is_none());
    }

    #[test]
    fn test_tool_call_failure() {
        let mut call = ToolCall::new("call_3", "E2b_RunCode", serde_json::json!({}));

        call.start();
        call.fail("sandbox unavailable");

        assert!(call.is_failed());
        assert_eq!(call.error.as_deref(), Some("sandbox unavailable"));
    }
}

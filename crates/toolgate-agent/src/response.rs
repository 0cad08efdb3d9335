use serde::{Deserialize, Serialize};
use toolgate_core::message::ImageContent;
use toolgate_core::{SessionId, ToolCall};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
    pub output: String,
    pub is_error: bool,
    pub duration_ms: u64,
}

impl ToolCallRecord {
    pub fn from_call(call: &ToolCall) -> Self {
        let is_error = !call.is_completed();
        let output = call
            .output
            .clone()
            .or_else(|| call.error.clone())
            .unwrap_or_default();

        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            input: call.input.clone(),
            output,
            is_error,
            duration_ms: call.duration_ms().unwrap_or(0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentResponse {
    pub session_id: SessionId,
    pub text: String,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Images produced by tools during the turn, in call order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageContent>,
    pub iterations: usize,
}

impl AgentResponse {
    pub fn new(session_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            session_id,
            text: text.into(),
            tool_calls: Vec::new(),
            images: Vec::new(),
            iterations: 1,
        }
    }

    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = tool_calls;
        self
    }

    pub fn with_images(mut self, images: Vec<ImageContent>) -> Self {
        self.images = images;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn tool_call_count(&self) -> usize {
        self.tool_calls.len()
    }

    pub fn failed_tool_calls(&self) -> impl Iterator<Item = &ToolCallRecord> {
        self.tool_calls.iter().filter(|tc| tc.is_error)
    }
}

use super::content::{ContentBlock, ImageContent, ToolResult, ToolUse};
use super::role::Role;
use crate::types::{MessageId, Metadata, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: Vec<ContentBlock>,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            created_at: Timestamp::now(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![ContentBlock::text(text)])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentBlock::text(text)])
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, vec![ContentBlock::text(text)])
    }

    pub fn tool(results: Vec<ToolResult>) -> Self {
        Self::new(
            Role::Tool,
            results.into_iter().map(ContentBlock::tool_result).collect(),
        )
    }

    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    pub fn has_tool_use(&self) -> bool {
        self.content.iter().any(|b| b.is_tool_use())
    }

    pub fn tool_uses(&self) -> Vec<&ToolUse> {
        self.content
            .iter()
            .filter_map(|b| b.as_tool_use())
            .collect()
    }

    pub fn tool_results(&self) -> Vec<&ToolResult> {
        self.content
            .iter()
            .filter_map(|b| b.as_tool_result())
            .collect()
    }

    pub fn images(&self) -> Vec<&ImageContent> {
        self.content.iter().filter_map(|b| b.as_image()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn push(&mut self, block: ContentBlock) {
        self.content.push(block);
    }
}

#[derive(Default)]
pub struct MessageBuilder {
    role: Option<Role>,
    content: Vec<ContentBlock>,
    metadata: Metadata,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn user(self) -> Self {
        self.role(Role::User)
    }

    pub fn assistant(self) -> Self {
        self.role(Role::Assistant)
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentBlock::text(text));
        self
    }

    pub fn tool_use(mut self, tool_use: ToolUse) -> Self {
        self.content.push(ContentBlock::ToolUse(tool_use));
        self
    }

    pub fn image(mut self, image: ImageContent) -> Self {
        self.content.push(ContentBlock::Image(image));
        self
    }

    pub fn metadata<K: Into<String>, V: Serialize>(mut self, key: K, value: V) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Drops empty text blocks so assistant turns that only call tools stay text-free.
    pub fn build(self) -> Result<Message, &'static str> {
        let role = self.role.ok_or("role is required")?;
        let content: Vec<ContentBlock> = self
            .content
            .into_iter()
            .filter(|b| b.as_text().map_or(true, |t| !t.is_empty()))
            .collect();
        if content.is_empty() {
            return Err("content is required");
        }
        Ok(Message::new(role, content).with_metadata(self.metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text_content(), "Hello");
    }

    #[test]
    fn test_builder_drops_empty_text() {
        let msg = MessageBuilder::new()
            .assistant()
            .text("")
            .tool_use(ToolUse::new("call_1", "E2b_RunCode", serde_json::json!({})))
            .build()
            .unwrap();

        assert_eq!(msg.content.len(), 1);
        assert!(msg.has_tool_use());
        assert_eq!(msg.text_content(), "");
    }

    #[test]
    fn test_builder_requires_content() {
        let result = MessageBuilder::new().user().text("").build();
        assert_eq!(result.unwrap_err(), "content is required");
    }

    #[test]
    fn test_tool_message() {
        let msg = Message::tool(vec![
            ToolResult::success("a", "ok"),
            ToolResult::error("b", "boom"),
        ]);
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_results().len(), 2);
    }
}

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_core::message::{ImageContent, ToolResult};
use toolgate_core::{Context, ToolDefinition};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(default)]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            artifacts: vec![],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn images(&self) -> Vec<ImageContent> {
        self.artifacts.iter().filter_map(Artifact::to_image).collect()
    }

    /// Converts into the tool-result block fed back to the model.
    pub fn into_result(self, tool_use_id: impl Into<String>) -> ToolResult {
        if self.is_error {
            ToolResult::error(tool_use_id, self.content)
        } else {
            ToolResult::success(tool_use_id, self.content)
        }
    }
}

/// A binary file a tool produced, carried as base64.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub content_type: String,
    pub data: String,
}

impl Artifact {
    pub fn png(name: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: "image/png".to_string(),
            data: base64_data.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub fn to_image(&self) -> Option<ImageContent> {
        if !self.is_image() {
            return None;
        }
        let mut image = ImageContent::png_base64(self.data.clone()).with_alt(self.name.clone());
        image.media_type = Some(self.content_type.clone());
        Some(image)
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> &ToolDefinition;

    async fn execute(&self, ctx: &Context, input: Value) -> Result<ToolOutput>;

    fn validate_input(&self, input: &Value) -> Result<()> {
        let missing = self.definition().missing_params(input);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(crate::error::ToolError::invalid_input(format!(
                "missing required parameter(s): {}",
                missing.join(", ")
            )))
        }
    }

    fn name(&self) -> &str {
        &self.definition().name
    }

    fn is_dangerous(&self) -> bool {
        self.definition().dangerous
    }
}

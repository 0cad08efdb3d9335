use super::client::RemoteToolClient;
use crate::error::{Result, ToolError};
use crate::traits::{Artifact, Tool, ToolOutput};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use toolgate_core::utils::looks_like_png_base64;
use toolgate_core::{Context, ToolDefinition};

/// A tool that runs on the remote service.
pub struct RemoteTool {
    client: Arc<RemoteToolClient>,
    def: ToolDefinition,
    user_id: Option<String>,
}

impl RemoteTool {
    pub fn new(client: Arc<RemoteToolClient>, def: ToolDefinition) -> Self {
        Self {
            client,
            def,
            user_id: None,
        }
    }

    /// Fallback identity when the call context carries none.
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    async fn execute(&self, ctx: &Context, input: Value) -> Result<ToolOutput> {
        let user_id = ctx
            .user_id()
            .or(self.user_id.as_deref())
            .ok_or_else(|| ToolError::invalid_input("no user id to execute the tool for"))?;

        let value = self.client.execute(&self.def.name, &input, user_id).await?;
        render_output(&self.def.name, value)
    }
}

/// Strings pass through, other JSON is pretty-printed. PNG payloads become
/// image artifacts and are replaced by a placeholder in the text.
pub fn render_output(tool_name: &str, mut value: Value) -> Result<ToolOutput> {
    let mut images = Vec::new();
    extract_images(&mut value, &mut images);

    let content = match &value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other)?,
    };

    let mut output = ToolOutput::text(content);
    for (index, data) in images.into_iter().enumerate() {
        output = output.with_artifact(Artifact::png(format!("{}-{}", tool_name, index + 1), data));
    }
    Ok(output)
}

fn extract_images(value: &mut Value, images: &mut Vec<String>) {
    match value {
        Value::String(s) if looks_like_png_base64(s) => {
            images.push(std::mem::take(s));
            *s = format!("[image {} attached]", images.len());
        }
        Value::Array(items) => items.iter_mut().for_each(|v| extract_images(v, images)),
        Value::Object(map) => map.values_mut().for_each(|v| extract_images(v, images)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

    #[test]
    fn test_string_output_passes_through() {
        let output = render_output("E2b_RunCode", json!("hello\n")).unwrap();
        assert_eq!(output.content, "hello\n");
        assert!(output.artifacts.is_empty());
    }

    #[test]
    fn test_json_output_is_pretty_printed() {
        let output = render_output("E2b_RunCode", json!({"stdout": ["4"], "error": null})).unwrap();
        assert!(output.content.contains("\"stdout\": [\n"));
    }

    #[test]
    fn test_png_becomes_artifact() {
        let output = render_output(
            "E2b_CreateStaticMatplotlibChart",
            json!({"type": "image/png", "image_data": PNG}),
        )
        .unwrap();

        assert!(!output.content.contains(PNG));
        assert!(output.content.contains("[image 1 attached]"));
        assert_eq!(output.artifacts.len(), 1);
        assert_eq!(output.artifacts[0].name, "E2b_CreateStaticMatplotlibChart-1");
        assert_eq!(output.images().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_tool_uses_context_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/tools/execute"))
            .and(body_partial_json(json!({"user_id": "ctx-user"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "output": {"value": "ok"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Arc::new(RemoteToolClient::new("arc-key", server.uri()).unwrap());
        let tool = RemoteTool::new(client, ToolDefinition::new("E2b_RunCode", "Run code"))
            .with_user("fallback-user");

        let ctx = Context::new().with_user("ctx-user");
        let output = tool.execute(&ctx, json!({"code": "1"})).await.unwrap();
        assert_eq!(output.content, "ok");
    }

    #[tokio::test]
    async fn test_remote_tool_without_user_fails() {
        let client = Arc::new(RemoteToolClient::new("arc-key", "http://127.0.0.1:9").unwrap());
        let tool = RemoteTool::new(client, ToolDefinition::new("E2b_RunCode", "Run code"));

        let err = tool.execute(&Context::new(), json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}

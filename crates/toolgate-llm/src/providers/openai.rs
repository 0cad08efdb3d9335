use crate::error::{LlmError, Result};
use crate::traits::LlmProvider;
use crate::types::{
    CompletionRequest, CompletionResponse, ModelInfo, StopReason, TokenUsage, ToolChoice,
};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use toolgate_core::config::LlmConfig;
use toolgate_core::message::{ContentBlock, ToolUse};
use toolgate_core::{Message, Role, ToolDefinition};
use tracing::{debug, warn};

const PROVIDER: &str = "openai";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.openai.com/v1")
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::build(api_key.into(), base_url.into(), Duration::from_secs(300))
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Config("missing OpenAI API key".to_string()))?;
        let mut provider = Self::build(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        if let Some(model) = &config.model {
            provider.default_model = model.clone();
        }
        provider.temperature = config.temperature;
        provider.max_tokens = config.max_tokens;
        Ok(provider)
    }

    fn build(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: "gpt-4o".to_string(),
            temperature: None,
            max_tokens: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    fn convert_messages(&self, messages: &[Message], system: Option<&str>) -> Vec<OpenAiMessage> {
        let mut result = Vec::with_capacity(messages.len() + 1);

        if let Some(sys) = system {
            result.push(OpenAiMessage::text("system", sys));
        }

        for msg in messages {
            match msg.role {
                Role::System => result.push(OpenAiMessage::text("system", msg.text_content())),
                Role::User => {
                    let content = if msg.content.iter().all(ContentBlock::is_text) {
                        OpenAiContent::Text(msg.text_content())
                    } else {
                        convert_content_parts(&msg.content)
                    };
                    result.push(OpenAiMessage {
                        role: "user".to_string(),
                        content: Some(content),
                        tool_calls: None,
                        tool_call_id: None,
                    });
                }
                Role::Assistant => {
                    let tool_calls: Vec<OpenAiToolCall> = msg
                        .tool_uses()
                        .into_iter()
                        .map(|tu| OpenAiToolCall {
                            id: tu.id.clone(),
                            r#type: "function".to_string(),
                            function: OpenAiFunctionCall {
                                name: tu.name.clone(),
                                arguments: tu.input.to_string(),
                            },
                        })
                        .collect();
                    let text = msg.text_content();

                    result.push(OpenAiMessage {
                        role: "assistant".to_string(),
                        content: (!text.is_empty()).then_some(OpenAiContent::Text(text)),
                        tool_calls: (!tool_calls.is_empty()).then_some(tool_calls),
                        tool_call_id: None,
                    });
                }
                Role::Tool => {
                    for tr in msg.tool_results() {
                        result.push(OpenAiMessage {
                            role: "tool".to_string(),
                            content: Some(OpenAiContent::Text(tr.text().to_string())),
                            tool_calls: None,
                            tool_call_id: Some(tr.tool_use_id.clone()),
                        });
                    }
                }
            }
        }

        result
    }

    fn build_body(&self, request: &CompletionRequest) -> Result<Value> {
        let messages = self.convert_messages(&request.messages, request.system.as_deref());
        let model = if request.model.is_empty() {
            self.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        if let Some(max_tokens) = request.max_tokens.or(self.max_tokens) {
            body["max_tokens"] = max_tokens.into();
        }
        if let Some(temp) = request.temperature.or(self.temperature) {
            body["temperature"] = temp.into();
        }
        if let Some(user) = &request.user {
            body["user"] = user.clone().into();
        }
        if let Some(tools) = &request.tools {
            body["tools"] = serde_json::to_value(convert_tools(tools))?;
            if let Some(choice) = &request.tool_choice {
                body["tool_choice"] = convert_tool_choice(choice);
            }
        }

        Ok(body)
    }

    fn parse_response(&self, response: OpenAiResponse) -> Result<CompletionResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::invalid_response("No choices in response"))?;

        let mut content_blocks = Vec::new();

        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content_blocks.push(ContentBlock::text(text));
        }

        for tc in choice.message.tool_calls.unwrap_or_default() {
            let input: Value = match serde_json::from_str(&tc.function.arguments) {
                Ok(value) => value,
                Err(e) => {
                    warn!(tool = %tc.function.name, error = %e, "Model sent malformed tool arguments");
                    Value::Object(Default::default())
                }
            };
            content_blocks.push(ContentBlock::tool_use(ToolUse::new(
                tc.id,
                tc.function.name,
                input,
            )));
        }

        let message = Message::new(Role::Assistant, content_blocks);
        let stop_reason = choice
            .finish_reason
            .as_deref()
            .map(StopReason::from_finish_reason)
            .unwrap_or(StopReason::EndTurn);
        let usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(CompletionResponse::new(response.id, response.model, message)
            .with_usage(usage)
            .with_stop_reason(stop_reason))
    }

    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok())
            .map(|secs| (secs * 1000.0) as u64);
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OpenAiErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or(text);

        Err(match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::rate_limited(PROVIDER, retry_after_ms),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                LlmError::AuthenticationFailed(message)
            }
            StatusCode::BAD_REQUEST if message.contains("context length") => {
                LlmError::ContextLengthExceeded(message)
            }
            _ => LlmError::api(PROVIDER, format!("{}: {}", status, message)),
        })
    }
}

fn convert_content_parts(content: &[ContentBlock]) -> OpenAiContent {
    let parts = content
        .iter()
        .filter_map(|c| match c {
            ContentBlock::Text { text } => Some(OpenAiContentPart::Text { text: text.clone() }),
            ContentBlock::Image(img) => Some(OpenAiContentPart::ImageUrl {
                image_url: OpenAiImageUrl { url: img.to_uri() },
            }),
            _ => None,
        })
        .collect();

    OpenAiContent::Parts(parts)
}

fn convert_tools(tools: &[ToolDefinition]) -> Vec<OpenAiTool> {
    tools
        .iter()
        .map(|t| OpenAiTool {
            r#type: "function".to_string(),
            function: OpenAiFunction {
                name: t.name.clone(),
                description: (!t.description.is_empty()).then(|| t.description.clone()),
                parameters: t.parameters.clone(),
            },
        })
        .collect()
}

fn convert_tool_choice(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::Auto => Value::String("auto".to_string()),
        ToolChoice::None => Value::String("none".to_string()),
        ToolChoice::Required => Value::String("required".to_string()),
        ToolChoice::Tool { name } => serde_json::json!({
            "type": "function",
            "function": { "name": name }
        }),
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_body(&request)?;
        debug!(
            model = %body["model"],
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Sending chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let openai_response: OpenAiResponse = response.json().await?;
        self.parse_response(openai_response)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;

        let list: OpenAiModelList = response.json().await?;
        Ok(list
            .data
            .into_iter()
            .map(|m| {
                let info = ModelInfo::new(m.id, PROVIDER);
                match m.owned_by {
                    Some(owner) => info.with_owner(owner),
                    None => info,
                }
            })
            .collect())
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<OpenAiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(OpenAiContent::Text(text.into())),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OpenAiContent {
    Text(String),
    Parts(Vec<OpenAiContentPart>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum OpenAiContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: OpenAiImageUrl },
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiImageUrl {
    url: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    r#type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    r#type: String,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: String,
    model: String,
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiModelList {
    data: Vec<OpenAiModel>,
}

#[derive(Debug, Deserialize)]
struct OpenAiModel {
    id: String,
    owned_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolgate_core::message::ToolResult;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::with_base_url("test-key", server.uri())
            .unwrap()
            .with_model("gpt-4o-mini")
    }

    #[test]
    fn test_provider_creation() {
        let provider = OpenAiProvider::new("test-key").unwrap().with_model("gpt-4.1");

        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4.1");
    }

    #[test]
    fn test_message_conversion_with_tool_round() {
        let provider = OpenAiProvider::new("test-key").unwrap();

        let messages = vec![
            Message::user("Plot sin(x)"),
            Message::new(
                Role::Assistant,
                vec![ContentBlock::tool_use(ToolUse::new(
                    "call_1",
                    "E2b_CreateStaticMatplotlibChart",
                    json!({"code": "plt.plot([1,2])"}),
                ))],
            ),
            Message::tool(vec![ToolResult::error("call_1", "Traceback ...")]),
        ];

        let converted = provider.convert_messages(&messages, Some("You are helpful"));

        assert_eq!(converted.len(), 4);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
        assert_eq!(converted[2].role, "assistant");
        assert!(converted[2].content.is_none());
        assert_eq!(converted[2].tool_calls.as_ref().unwrap()[0].id, "call_1");
        assert_eq!(converted[3].role, "tool");
        assert_eq!(converted[3].tool_call_id.as_deref(), Some("call_1"));
        match &converted[3].content {
            Some(OpenAiContent::Text(text)) => assert_eq!(text, "Traceback ..."),
            other => panic!("unexpected tool content: {:?}", other),
        }
    }

    #[test]
    fn test_body_includes_tools_with_raw_schema() {
        let provider = OpenAiProvider::new("test-key").unwrap();
        let schema = json!({
            "type": "object",
            "properties": {"code": {"type": "string"}},
            "required": ["code"],
            "additionalProperties": false
        });
        let request = CompletionRequest::new("gpt-4o", vec![Message::user("hi")])
            .with_tools(vec![ToolDefinition::new("E2b_RunCode", "Run code").with_schema(schema.clone())])
            .with_tool_choice(ToolChoice::Auto);

        let body = provider.build_body(&request).unwrap();
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["parameters"], schema);
        assert_eq!(body["tool_choice"], "auto");
    }

    #[tokio::test]
    async fn test_complete_parses_tool_calls() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o-mini",
                "choices": [{
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_9",
                            "type": "function",
                            "function": {"name": "E2b_RunCode", "arguments": "{\"code\":\"print(2+2)\"}"}
                        }]
                    },
                    "finish_reason": "tool_calls"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(CompletionRequest::new("", vec![Message::user("2+2?")]))
            .await
            .unwrap();

        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
        assert_eq!(response.usage.total(), 19);
        let uses = response.message.tool_uses();
        assert_eq!(uses.len(), 1);
        assert_eq!(uses[0].name, "E2b_RunCode");
        assert_eq!(uses[0].input["code"], "print(2+2)");
    }

    #[tokio::test]
    async fn test_complete_maps_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"error": {"message": "Incorrect API key provided"}})),
            )
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(CompletionRequest::new("gpt-4o", vec![Message::user("hi")]))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::AuthenticationFailed(ref m) if m.contains("Incorrect API key")));
    }

    #[tokio::test]
    async fn test_rate_limit_reads_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "2"))
            .mount(&server)
            .await;

        let err = provider(&server)
            .complete(CompletionRequest::new("gpt-4o", vec![Message::user("hi")]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LlmError::RateLimited { retry_after_ms: Some(2000), .. }
        ));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [
                    {"id": "gpt-4o", "object": "model", "owned_by": "system"},
                    {"id": "gpt-4o-mini", "object": "model", "owned_by": "system"}
                ]
            })))
            .mount(&server)
            .await;

        let models = provider(&server).list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert!(models.iter().any(|m| m.id == "gpt-4o"));
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use toolgate_core::ToolDefinition;

/// One page of `GET /v1/formatted_tools`.
#[derive(Debug, Deserialize)]
pub struct FormattedToolsPage {
    #[serde(default)]
    pub items: Vec<FormattedTool>,
    #[serde(default)]
    pub total_count: Option<usize>,
}

/// A tool in OpenAI function format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormattedTool {
    #[serde(default = "function_type")]
    pub r#type: String,
    pub function: FormattedFunction,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormattedFunction {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

impl FormattedTool {
    pub fn into_definition(self) -> ToolDefinition {
        let category = self
            .function
            .name
            .split_once('_')
            .map(|(toolkit, _)| toolkit.to_string());
        let mut def = ToolDefinition::new(
            self.function.name,
            self.function.description.unwrap_or_default(),
        );
        if let Some(schema) = self.function.parameters {
            def = def.with_schema(schema);
        }
        if let Some(category) = category {
            def = def.with_category(category);
        }
        def
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    NotStarted,
    Pending,
    Completed,
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub status: AuthorizationStatus,
    /// Where the user completes the grant, while it is pending.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl AuthorizationResponse {
    pub fn is_completed(&self) -> bool {
        self.status == AuthorizationStatus::Completed
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthorizeRequest<'a> {
    pub tool_name: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExecuteRequest<'a> {
    pub tool_name: &'a str,
    pub input: &'a Value,
    pub user_id: &'a str,
}

/// Result of `POST /v1/tools/execute`.
#[derive(Clone, Debug, Deserialize)]
pub struct ExecuteToolResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub output: Option<ToolExecutionOutput>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ToolExecutionOutput {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub error: Option<ToolExecutionError>,
    #[serde(default)]
    pub authorization: Option<AuthorizationResponse>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ToolExecutionError {
    pub message: String,
    #[serde(default)]
    pub additional_prompt_content: Option<String>,
    #[serde(default)]
    pub can_retry: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

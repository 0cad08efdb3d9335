use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool input, always an object schema.
    pub parameters: Value,
    /// Calls to a dangerous tool must be confirmed by a human first.
    #[serde(default)]
    pub dangerous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: empty_object_schema(),
            dangerous: false,
            category: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.parameters = if schema.is_object() {
            schema
        } else {
            empty_object_schema()
        };
        self
    }

    pub fn dangerous(mut self) -> Self {
        self.dangerous = true;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.parameters
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn required_params(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|req| req.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Reports every required parameter absent from `input`.
    pub fn missing_params(&self, input: &Value) -> Vec<String> {
        let provided: BTreeMap<&str, &Value> = input
            .as_object()
            .map(|obj| obj.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default();

        self.required_params()
            .into_iter()
            .filter(|name| provided.get(name).map_or(true, |v| v.is_null()))
            .map(str::to_string)
            .collect()
    }
}

fn empty_object_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

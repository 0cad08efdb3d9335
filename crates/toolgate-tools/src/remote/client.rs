use super::types::{
    ApiErrorBody, AuthorizationResponse, AuthorizationStatus, AuthorizeRequest, ExecuteRequest,
    ExecuteToolResponse, FormattedTool, FormattedToolsPage,
};
use crate::error::{Result, ToolError};
use futures::future::try_join_all;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use toolgate_core::config::RemoteConfig;
use toolgate_core::ToolDefinition;
use tracing::{debug, info, warn};

const PAGE_SIZE: usize = 25;
/// Longest server-side wait per status poll.
const STATUS_WAIT_SECS: u64 = 45;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Told when the user has to grant access before a tool can run.
pub trait AuthorizationNotifier: Send + Sync {
    fn pending(&self, tool_name: &str, url: &str);

    fn granted(&self, tool_name: &str);
}

/// Client for the hosted tool-execution service.
pub struct RemoteToolClient {
    http: Client,
    base_url: String,
    api_key: String,
    auth_timeout: Duration,
    notifier: Option<Arc<dyn AuthorizationNotifier>>,
}

/// Outcome of a single execute request.
enum Execution {
    Done(Value),
    NeedsAuthorization(AuthorizationResponse),
}

impl RemoteToolClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::build(api_key.into(), base_url.into(), Duration::from_secs(120))
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| toolgate_core::Error::missing_config("ARCADE_API_KEY"))?;
        let client = Self::build(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.tool_timeout_secs.max(STATUS_WAIT_SECS + 15)),
        )?;
        Ok(client.with_auth_timeout(Duration::from_secs(config.auth_timeout_secs)))
    }

    fn build(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_timeout: Duration::from_secs(600),
            notifier: None,
        })
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn AuthorizationNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or(text);
        Err(ToolError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    /// Every tool of `toolkit`, following pagination.
    pub async fn list_tools(&self, toolkit: &str, limit: usize) -> Result<Vec<ToolDefinition>> {
        let mut tools = Vec::new();
        let mut offset = 0;

        while tools.len() < limit {
            let page_size = PAGE_SIZE.min(limit - tools.len());
            let response = self
                .http
                .get(self.url("/v1/formatted_tools"))
                .bearer_auth(&self.api_key)
                .query(&[
                    ("toolkit", toolkit.to_string()),
                    ("format", "openai".to_string()),
                    ("limit", page_size.to_string()),
                    ("offset", offset.to_string()),
                ])
                .send()
                .await?;
            let page: FormattedToolsPage = Self::read_json(response).await?;

            let received = page.items.len();
            tools.extend(page.items.into_iter().map(FormattedTool::into_definition));
            offset += received;

            let exhausted = page.total_count.map_or(received < page_size, |total| offset >= total);
            if received == 0 || exhausted {
                break;
            }
        }

        debug!(toolkit, count = tools.len(), "Fetched toolkit");
        Ok(tools)
    }

    pub async fn get_tool(&self, name: &str) -> Result<ToolDefinition> {
        let response = self
            .http
            .get(self.url(&format!("/v1/formatted_tools/{}", name)))
            .bearer_auth(&self.api_key)
            .query(&[("format", "openai")])
            .send()
            .await?;

        match Self::read_json::<FormattedTool>(response).await {
            Ok(tool) => Ok(tool.into_definition()),
            Err(ToolError::Remote { status: 404, .. }) => Err(ToolError::not_found(name)),
            Err(e) => Err(e),
        }
    }

    /// Toolkits and individual tools combined, one definition per name.
    pub async fn fetch_tools(
        &self,
        toolkits: &[String],
        tools: &[String],
        limit: usize,
    ) -> Result<Vec<ToolDefinition>> {
        let kits = try_join_all(toolkits.iter().map(|kit| self.list_tools(kit, limit))).await?;
        let singles = try_join_all(tools.iter().map(|name| self.get_tool(name))).await?;

        let mut by_name = BTreeMap::new();
        for def in kits.into_iter().flatten().chain(singles) {
            by_name.entry(def.name.clone()).or_insert(def);
        }

        info!(count = by_name.len(), "Fetched remote tools");
        Ok(by_name.into_values().take(limit).collect())
    }

    pub async fn authorize(&self, tool_name: &str, user_id: &str) -> Result<AuthorizationResponse> {
        let response = self
            .http
            .post(self.url("/v1/tools/authorize"))
            .bearer_auth(&self.api_key)
            .json(&AuthorizeRequest { tool_name, user_id })
            .send()
            .await?;
        Self::read_json(response).await
    }

    pub async fn auth_status(&self, auth_id: &str, wait_secs: u64) -> Result<AuthorizationResponse> {
        let response = self
            .http
            .get(self.url("/v1/auth/status"))
            .bearer_auth(&self.api_key)
            .query(&[("id", auth_id.to_string()), ("wait", wait_secs.to_string())])
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Polls until the grant completes, fails, or the auth timeout elapses.
    pub async fn wait_for_authorization(&self, auth_id: &str) -> Result<AuthorizationResponse> {
        let started = Instant::now();

        loop {
            let elapsed = started.elapsed();
            if elapsed >= self.auth_timeout {
                return Err(ToolError::Timeout(self.auth_timeout.as_millis() as u64));
            }
            let wait = STATUS_WAIT_SECS.min((self.auth_timeout - elapsed).as_secs());

            let auth = self.auth_status(auth_id, wait).await?;
            match auth.status {
                AuthorizationStatus::Completed => return Ok(auth),
                AuthorizationStatus::Failed => {
                    return Err(ToolError::authorization(auth_id, "authorization failed"))
                }
                status => {
                    debug!(auth_id, ?status, "Authorization still pending");
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
            }
        }
    }

    /// Authorizes `tool_name` for `user_id`, waiting while the user still
    /// has to act on the grant URL.
    pub async fn authorize_tool(&self, tool_name: &str, user_id: &str) -> Result<AuthorizationResponse> {
        let auth = self.authorize(tool_name, user_id).await?;
        if auth.is_completed() {
            debug!(tool = tool_name, "Tool already authorized");
            return Ok(auth);
        }
        self.await_grant(tool_name, &auth).await
    }

    async fn await_grant(&self, tool_name: &str, auth: &AuthorizationResponse) -> Result<AuthorizationResponse> {
        if auth.status == AuthorizationStatus::Failed {
            return Err(ToolError::authorization(tool_name, "authorization failed"));
        }
        let auth_id = auth
            .id
            .as_deref()
            .ok_or_else(|| ToolError::authorization(tool_name, "missing authorization id"))?;

        if let Some(notifier) = &self.notifier {
            notifier.pending(tool_name, auth.url.as_deref().unwrap_or_default());
        }
        let granted = self.wait_for_authorization(auth_id).await?;
        if let Some(notifier) = &self.notifier {
            notifier.granted(tool_name);
        }

        info!(tool = tool_name, "Tool authorized");
        Ok(granted)
    }

    /// Runs the tool remotely and returns its output value. A call that
    /// needs a fresh grant waits for it and is retried once.
    pub async fn execute(&self, tool_name: &str, input: &Value, user_id: &str) -> Result<Value> {
        let auth = match self.execute_once(tool_name, input, user_id).await? {
            Execution::Done(value) => return Ok(value),
            Execution::NeedsAuthorization(auth) => auth,
        };

        self.await_grant(tool_name, &auth).await?;

        match self.execute_once(tool_name, input, user_id).await? {
            Execution::Done(value) => Ok(value),
            Execution::NeedsAuthorization(auth) => Err(ToolError::authorization(
                tool_name,
                format!(
                    "authorization required, visit {}",
                    auth.url.unwrap_or_default()
                ),
            )),
        }
    }

    async fn execute_once(&self, tool_name: &str, input: &Value, user_id: &str) -> Result<Execution> {
        let response = self
            .http
            .post(self.url("/v1/tools/execute"))
            .bearer_auth(&self.api_key)
            .json(&ExecuteRequest {
                tool_name,
                input,
                user_id,
            })
            .send()
            .await?;
        let result: ExecuteToolResponse = Self::read_json(response).await?;
        debug!(
            tool = tool_name,
            execution_id = result.execution_id.as_deref().unwrap_or_default(),
            success = result.success,
            "Remote execution finished"
        );

        let output = result.output.unwrap_or_default();

        if let Some(auth) = output.authorization.filter(|a| !a.is_completed()) {
            return Ok(Execution::NeedsAuthorization(auth));
        }

        if !result.success {
            let message = output
                .error
                .map(|e| e.message)
                .or(result.status)
                .unwrap_or_else(|| "unknown error".to_string());
            warn!(tool = tool_name, error = %message, "Remote execution failed");
            return Err(ToolError::execution_failed(tool_name, message));
        }

        Ok(Execution::Done(output.value.unwrap_or(Value::Null)))
    }
}

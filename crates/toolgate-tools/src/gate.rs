//! Human confirmation in front of sensitive tool calls.
//!
//! A [`ToolGate`] holds the names of tools that must be approved before they
//! run. [`ToolGate::wrap`] puts a [`GatedTool`] around each of them; every call
//! then goes through [`confirm_tool_usage`], which asks a [`Confirmer`] and
//! either runs the tool or returns [`ToolError::Denied`].

use crate::error::{Result, ToolError};
use crate::traits::{Tool, ToolOutput};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use toolgate_core::config::SecurityConfig;
use toolgate_core::{Context, ToolDefinition};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmationRequest {
    pub tool_name: String,
    pub input: Value,
}

impl ConfirmationRequest {
    pub fn new(tool_name: impl Into<String>, input: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            input,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Deny,
}

impl Decision {
    /// `y` or `yes` in any case approves; anything else denies.
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => Decision::Approve,
            _ => Decision::Deny,
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approve)
    }
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, request: &ConfirmationRequest) -> Result<Decision>;
}

/// Asks `confirmer` about the call and runs `callback` with the original
/// input only on approval. A confirmer that fails to answer counts as a denial.
pub async fn confirm_tool_usage<F, Fut, T>(
    confirmer: &dyn Confirmer,
    tool_name: &str,
    input: Value,
    callback: F,
) -> Result<T>
where
    F: FnOnce(Value) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let request = ConfirmationRequest::new(tool_name, input);
    let decision = confirmer.confirm(&request).await.unwrap_or_else(|e| {
        warn!(tool = tool_name, error = %e, "Confirmation failed, treating as denied");
        Decision::Deny
    });
    match decision {
        Decision::Approve => {
            info!(tool = tool_name, "Tool call approved");
            callback(request.input).await
        }
        Decision::Deny => {
            info!(tool = tool_name, "Tool call denied");
            Err(ToolError::denied(tool_name))
        }
    }
}

/// A tool that only runs after its confirmer approves the call.
pub struct GatedTool {
    inner: Arc<dyn Tool>,
    confirmer: Arc<dyn Confirmer>,
    def: ToolDefinition,
}

impl GatedTool {
    pub fn new(inner: Arc<dyn Tool>, confirmer: Arc<dyn Confirmer>) -> Self {
        let def = inner.definition().clone().dangerous();
        Self {
            inner,
            confirmer,
            def,
        }
    }

    pub fn inner(&self) -> &Arc<dyn Tool> {
        &self.inner
    }
}

#[async_trait]
impl Tool for GatedTool {
    fn definition(&self) -> &ToolDefinition {
        &self.def
    }

    async fn execute(&self, ctx: &Context, input: Value) -> Result<ToolOutput> {
        let inner = &self.inner;
        confirm_tool_usage(self.confirmer.as_ref(), &self.def.name, input, |input| {
            inner.execute(ctx, input)
        })
        .await
    }

    fn validate_input(&self, input: &Value) -> Result<()> {
        self.inner.validate_input(input)
    }
}

/// Which tools need confirmation, and who is asked.
pub struct ToolGate {
    required: BTreeSet<String>,
    confirmer: Arc<dyn Confirmer>,
}

impl ToolGate {
    pub fn new<I, S>(tool_names: I, confirmer: Arc<dyn Confirmer>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: tool_names.into_iter().map(Into::into).collect(),
            confirmer,
        }
    }

    /// Console prompts, or blanket approval when `auto_approve` is set.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let confirmer: Arc<dyn Confirmer> = if config.auto_approve {
            Arc::new(StaticConfirmer::approve())
        } else {
            Arc::new(ConsoleConfirmer::new())
        };
        Self::new(config.require_confirmation.iter().cloned(), confirmer)
    }

    pub fn requires_confirmation(&self, tool_name: &str) -> bool {
        self.required.contains(tool_name)
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn wrap(&self, tool: Arc<dyn Tool>) -> Arc<dyn Tool> {
        if self.requires_confirmation(tool.name()) {
            debug!(tool = tool.name(), "Gating tool behind confirmation");
            Arc::new(GatedTool::new(tool, self.confirmer.clone()))
        } else {
            tool
        }
    }

    pub fn wrap_all(&self, tools: Vec<Arc<dyn Tool>>) -> Vec<Arc<dyn Tool>> {
        tools.into_iter().map(|tool| self.wrap(tool)).collect()
    }
}

type AnswerReader = dyn Fn(&ConfirmationRequest) -> io::Result<String> + Send + Sync;

/// Prompts on the terminal and reads the answer from standard input.
pub struct ConsoleConfirmer {
    read_answer: Arc<AnswerReader>,
}

impl ConsoleConfirmer {
    pub fn new() -> Self {
        Self::with_reader(prompt_stdin)
    }

    /// Replaces the terminal with `reader`, which is called on a blocking thread.
    pub fn with_reader<F>(reader: F) -> Self
    where
        F: Fn(&ConfirmationRequest) -> io::Result<String> + Send + Sync + 'static,
    {
        Self {
            read_answer: Arc::new(reader),
        }
    }
}

impl Default for ConsoleConfirmer {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_stdin(request: &ConfirmationRequest) -> io::Result<String> {
    let input = serde_json::to_string_pretty(&request.input)
        .unwrap_or_else(|_| request.input.to_string());

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "⚙️: Human in the loop required for tool call {}", request.tool_name)?;
    writeln!(stdout, "⚙️: Please approve the tool call\n{}", input)?;
    write!(stdout, "Do you approve this tool call? (y/n) ")?;
    stdout.flush()?;
    drop(stdout);

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer)
}

#[async_trait]
impl Confirmer for ConsoleConfirmer {
    async fn confirm(&self, request: &ConfirmationRequest) -> Result<Decision> {
        let reader = self.read_answer.clone();
        let request = request.clone();
        let tool_name = request.tool_name.clone();
        let answer = match tokio::task::spawn_blocking(move || reader(&request)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(tool = %tool_name, error = %e, "Could not read confirmation answer");
                return Ok(Decision::Deny);
            }
            Err(e) => {
                warn!(tool = %tool_name, error = %e, "Confirmation prompt aborted");
                return Ok(Decision::Deny);
            }
        };
        Ok(Decision::from_answer(&answer))
    }
}

/// Gives the same answer to every request.
#[derive(Clone, Copy, Debug)]
pub struct StaticConfirmer {
    decision: Decision,
}

impl StaticConfirmer {
    pub fn new(decision: Decision) -> Self {
        Self { decision }
    }

    pub fn approve() -> Self {
        Self::new(Decision::Approve)
    }

    pub fn deny() -> Self {
        Self::new(Decision::Deny)
    }
}

#[async_trait]
impl Confirmer for StaticConfirmer {
    async fn confirm(&self, _request: &ConfirmationRequest) -> Result<Decision> {
        Ok(self.decision)
    }
}

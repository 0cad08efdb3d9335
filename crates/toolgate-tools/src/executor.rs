use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::traits::ToolOutput;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use toolgate_core::{Context, ToolCall};
use tracing::{info, warn};

/// Looks tools up by name and runs them under a deadline.
pub struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    default_timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            default_timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub async fn execute(&self, ctx: &Context, name: &str, input: Value) -> Result<ToolOutput> {
        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::not_found(name))?;

        if ctx.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        tool.validate_input(&input)?;

        info!(tool = name, gated = tool.is_dangerous(), "Executing tool");

        let execute_timeout = ctx
            .remaining()
            .unwrap_or(self.default_timeout)
            .min(self.default_timeout);

        // Gated tools wait on a human, so the deadline only covers ungated ones.
        let result = if tool.is_dangerous() {
            Ok(tool.execute(ctx, input).await)
        } else {
            let cancellation = ctx.cancellation_token();
            tokio::select! {
                result = timeout(execute_timeout, tool.execute(ctx, input)) => result,
                _ = cancellation.cancelled() => {
                    info!(tool = name, "Tool execution cancelled");
                    return Err(ToolError::Cancelled);
                }
            }
        };

        match result {
            Ok(Ok(output)) => {
                info!(tool = name, is_error = output.is_error, "Tool execution completed");
                Ok(output)
            }
            Ok(Err(e)) if e.is_denied() => {
                info!(tool = name, "Tool call denied");
                Err(e)
            }
            Ok(Err(e)) => {
                warn!(tool = name, error = %e, "Tool execution failed");
                Err(e)
            }
            Err(_) => {
                warn!(tool = name, timeout_ms = execute_timeout.as_millis() as u64, "Tool execution timed out");
                Err(ToolError::Timeout(execute_timeout.as_millis() as u64))
            }
        }
    }

    /// Runs `call` and records the outcome on it.
    pub async fn execute_call(&self, ctx: &Context, call: &mut ToolCall) -> Result<ToolOutput> {
        call.start();

        match self.execute(ctx, &call.name, call.input.clone()).await {
            Ok(output) => {
                if output.is_error {
                    call.fail(&output.content);
                } else {
                    call.complete(&output.content);
                }
                Ok(output)
            }
            Err(e) => {
                if e.is_denied() {
                    call.deny();
                } else {
                    call.fail(e.to_string());
                }
                Err(e)
            }
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn is_gated(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .map(|t| t.is_dangerous())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{GatedTool, StaticConfirmer};
    use crate::traits::Tool;
    use async_trait::async_trait;
    use toolgate_core::ToolDefinition;

    struct EchoTool {
        def: ToolDefinition,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                def: ToolDefinition::new("echo", "Echoes input"),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _ctx: &Context, input: Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text(input.to_string()))
        }
    }

    struct SlowTool {
        def: ToolDefinition,
    }

    #[async_trait]
    impl Tool for SlowTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _ctx: &Context, _input: Value) -> Result<ToolOutput> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(ToolOutput::text("done"))
        }
    }

    fn executor_with(tools: Vec<Arc<dyn Tool>>) -> ToolExecutor {
        let mut registry = ToolRegistry::new();
        registry.register_all(tools).unwrap();
        ToolExecutor::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_executor_execute() {
        let executor = executor_with(vec![Arc::new(EchoTool::new())]);
        let ctx = Context::new();

        let output = executor
            .execute(&ctx, "echo", serde_json::json!({"message": "hello"}))
            .await
            .unwrap();

        assert!(output.content.contains("hello"));
    }

    #[tokio::test]
    async fn test_executor_not_found() {
        let executor = executor_with(vec![]);
        let result = executor.execute(&Context::new(), "nonexistent", Value::Null).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_executor_rejects_missing_params() {
        let tool = EchoTool {
            def: ToolDefinition::new("echo", "Echoes input")
                .with_schema(serde_json::json!({
                    "type": "object",
                    "properties": {"message": {"type": "string"}},
                    "required": ["message"]
                })),
        };
        let executor = executor_with(vec![Arc::new(tool)]);

        let result = executor.execute(&Context::new(), "echo", serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_executor_timeout() {
        let slow = SlowTool {
            def: ToolDefinition::new("slow", "A slow tool"),
        };
        let executor = executor_with(vec![Arc::new(slow)]).with_timeout(Duration::from_millis(100));

        let result = executor.execute(&Context::new(), "slow", Value::Null).await;
        assert!(matches!(result, Err(ToolError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_cancel_stops_running_tool() {
        let slow = SlowTool {
            def: ToolDefinition::new("slow", "A slow tool"),
        };
        let executor = executor_with(vec![Arc::new(slow)]);
        let ctx = Context::new();

        let token = ctx.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let result = executor.execute(&ctx, "slow", Value::Null).await;
        assert!(matches!(result, Err(ToolError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_context_runs_nothing() {
        let executor = executor_with(vec![Arc::new(EchoTool::new())]);
        let ctx = Context::new();
        ctx.cancel();

        let result = executor.execute(&ctx, "echo", serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::Cancelled)));
    }

    #[tokio::test]
    async fn test_executor_execute_call() {
        let executor = executor_with(vec![Arc::new(EchoTool::new())]);

        let mut call = ToolCall::new("call_1", "echo", serde_json::json!({"x": 1}));
        assert!(call.is_pending());

        let output = executor.execute_call(&Context::new(), &mut call).await.unwrap();

        assert!(call.is_completed());
        assert!(!output.is_error);
    }

    #[tokio::test]
    async fn test_denied_call_is_marked_denied() {
        let gated = GatedTool::new(Arc::new(EchoTool::new()), Arc::new(StaticConfirmer::deny()));
        let executor = executor_with(vec![Arc::new(gated)]);
        assert!(executor.is_gated("echo"));

        let mut call = ToolCall::new("call_2", "echo", serde_json::json!({"x": 1}));
        let err = executor.execute_call(&Context::new(), &mut call).await.unwrap_err();

        assert!(err.is_denied());
        assert!(call.is_denied());
        assert!(call.output.is_none());
    }
}

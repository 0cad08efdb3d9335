use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::hooks::AgentHooks;
use crate::response::{AgentResponse, ToolCallRecord};
use crate::session::Session;
use toolgate_core::message::{ContentBlock, ImageContent, ToolResult, ToolUse};
use toolgate_core::{Context, Message, Role, ToolCall};
use toolgate_llm::{CompletionRequest, LlmProvider, ToolChoice};
use toolgate_tools::ToolExecutor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one user turn: model call, tool calls, repeat until the model answers.
pub struct Executor {
    config: AgentConfig,
    llm: Arc<dyn LlmProvider>,
    tools: Option<Arc<ToolExecutor>>,
    hooks: Arc<dyn AgentHooks>,
    cancellation: CancellationToken,
}

/// Everything the tools produced in one iteration.
struct ToolRound {
    results: Vec<ToolResult>,
    records: Vec<ToolCallRecord>,
    images: Vec<ImageContent>,
}

impl Executor {
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmProvider>,
        tools: Option<Arc<ToolExecutor>>,
        hooks: Arc<dyn AgentHooks>,
    ) -> Self {
        Self {
            config,
            llm,
            tools,
            hooks,
            cancellation: CancellationToken::new(),
        }
    }

    /// Cancelling `token` stops the turn at the next model or tool call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub async fn execute(&self, session: &Session, user_input: &str) -> Result<AgentResponse> {
        session.add_message(Message::user(user_input));
        self.hooks.on_start(&self.config.name).await;

        let response = self.run(session).await?;

        self.hooks.on_end(&self.config.name, &response.text).await;
        Ok(response)
    }

    async fn run(&self, session: &Session) -> Result<AgentResponse> {
        let mut all_tool_calls = Vec::new();
        let mut all_images = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            session.increment_iterations();

            if iterations > self.config.max_iterations {
                return Err(AgentError::MaxIterationsReached(self.config.max_iterations));
            }
            if self.cancellation.is_cancelled() {
                return Err(AgentError::Cancelled);
            }

            info!(iteration = iterations, "Starting agent loop iteration");

            let request = self.build_request(session);
            let response = tokio::select! {
                response = self.llm.complete(request) => response?,
                _ = self.cancellation.cancelled() => {
                    info!("Model call cancelled");
                    return Err(AgentError::Cancelled);
                }
            };
            debug!(
                stop_reason = ?response.stop_reason,
                tokens = response.usage.total(),
                "Model responded"
            );

            let tool_uses: Vec<ToolUse> = response.message.tool_uses().into_iter().cloned().collect();

            if tool_uses.is_empty() {
                let text = response.text_content();
                session.add_message(Message::assistant(&text));

                return Ok(AgentResponse::new(*session.id(), text)
                    .with_tool_calls(all_tool_calls)
                    .with_images(all_images)
                    .with_iterations(iterations));
            }

            session.add_message(assistant_tool_message(&response.text_content(), &tool_uses));
            session.increment_tool_calls(tool_uses.len());

            let round = self.execute_tools(session, &tool_uses).await?;
            all_tool_calls.extend(round.records);
            all_images.extend(round.images);

            session.add_message(Message::tool(round.results));
        }
    }

    fn build_request(&self, session: &Session) -> CompletionRequest {
        let messages = session.last_messages(self.config.max_context_messages);

        let mut request = CompletionRequest::new(&self.config.model, messages)
            .with_system(&self.config.system_prompt);

        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(user_id) = &self.config.user_id {
            request = request.with_user(user_id);
        }

        if let Some(tools) = &self.tools {
            let definitions = tools.registry().definitions();
            if !definitions.is_empty() {
                request = request
                    .with_tools(definitions)
                    .with_tool_choice(ToolChoice::Auto);
            }
        }

        request
    }

    fn tool_context(&self, session: &Session) -> Context {
        let ctx = Context::new()
            .with_session(*session.id())
            .with_timeout(self.config.tool_timeout())
            .with_cancellation(self.cancellation.clone());
        match &self.config.user_id {
            Some(user_id) => ctx.with_user(user_id),
            None => ctx,
        }
    }

    /// Runs each call in order. A denial or cancellation ends the turn; any
    /// other failure becomes an error result the model gets to see.
    async fn execute_tools(&self, session: &Session, tool_uses: &[ToolUse]) -> Result<ToolRound> {
        let mut round = ToolRound {
            results: Vec::with_capacity(tool_uses.len()),
            records: Vec::with_capacity(tool_uses.len()),
            images: Vec::new(),
        };

        for tu in tool_uses {
            let mut call = ToolCall::new(&tu.id, &tu.name, tu.input.clone());
            self.hooks.on_tool_start(&self.config.name, &call).await;

            let result = match &self.tools {
                Some(tools) => {
                    let ctx = self.tool_context(session);
                    tools.execute_call(&ctx, &mut call).await
                }
                None => {
                    let message = format!("Tool execution not available: {}", tu.name);
                    call.fail(&message);
                    Err(toolgate_tools::ToolError::not_found(&tu.name))
                }
            };

            self.hooks.on_tool_end(&self.config.name, &call).await;

            match result {
                Ok(output) => {
                    round.images.extend(output.images());
                    round.results.push(output.into_result(&tu.id));
                }
                Err(e) if e.is_denied() => {
                    info!(tool = %tu.name, "Turn abandoned after denial");
                    return Err(e.into());
                }
                Err(toolgate_tools::ToolError::Cancelled) => return Err(AgentError::Cancelled),
                Err(e) => {
                    warn!(tool = %tu.name, error = %e, "Tool call failed");
                    round.results.push(ToolResult::error(&tu.id, e.to_string()));
                }
            }
            round.records.push(ToolCallRecord::from_call(&call));
        }

        Ok(round)
    }
}

fn assistant_tool_message(text: &str, tool_uses: &[ToolUse]) -> Message {
    let mut content = Vec::with_capacity(tool_uses.len() + 1);
    if !text.is_empty() {
        content.push(ContentBlock::text(text));
    }
    content.extend(tool_uses.iter().cloned().map(ContentBlock::tool_use));
    Message::new(Role::Assistant, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::testing::RecordingHooks;
    use crate::hooks::NoopHooks;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use toolgate_llm::{CompletionResponse, LlmError, ModelInfo};
    use toolgate_core::ToolDefinition;
    use toolgate_tools::{ConsoleConfirmer, GatedTool, StaticConfirmer, Tool, ToolOutput, ToolRegistry};

    struct MockLlm {
        responses: Mutex<Vec<CompletionResponse>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockLlm {
        fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlm {
        fn name(&self) -> &str {
            "mock"
        }

        async fn complete(&self, request: CompletionRequest) -> std::result::Result<CompletionResponse, LlmError> {
            self.requests.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(CompletionResponse::new("id", "model", Message::assistant("Default response")))
            } else {
                Ok(responses.remove(0))
            }
        }

        async fn list_models(&self) -> std::result::Result<Vec<ModelInfo>, LlmError> {
            Ok(vec![])
        }

        fn default_model(&self) -> &str {
            "mock"
        }
    }

    struct CodeTool {
        def: ToolDefinition,
        runs: Mutex<Vec<Value>>,
    }

    impl CodeTool {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                def: ToolDefinition::new(name, "runs code"),
                runs: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Tool for CodeTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _ctx: &Context, input: Value) -> toolgate_tools::Result<ToolOutput> {
            self.runs.lock().unwrap().push(input);
            Ok(ToolOutput::text("4"))
        }
    }

    fn tool_call_response(name: &str) -> CompletionResponse {
        CompletionResponse::new(
            "resp-tool",
            "mock",
            Message::new(
                Role::Assistant,
                vec![ContentBlock::tool_use(ToolUse::new(
                    "call_1",
                    name,
                    json!({"code": "print(2+2)"}),
                ))],
            ),
        )
    }

    fn executor_with(
        llm: Arc<MockLlm>,
        tools: Vec<Arc<dyn Tool>>,
        hooks: Arc<dyn AgentHooks>,
    ) -> Executor {
        let mut registry = ToolRegistry::new();
        registry.register_all(tools).unwrap();
        let config = AgentConfig::new("mock", "You are helpful.")
            .with_name("analyst")
            .with_user("dev@example.com");
        Executor::new(
            config,
            llm,
            Some(Arc::new(ToolExecutor::new(Arc::new(registry)))),
            hooks,
        )
    }

    #[tokio::test]
    async fn test_executor_simple_response() {
        let llm = Arc::new(MockLlm::new(vec![CompletionResponse::new(
            "resp-1",
            "mock",
            Message::assistant("Hello!"),
        )]));
        let executor = Executor::new(
            AgentConfig::new("mock", "You are helpful."),
            llm,
            None,
            Arc::new(NoopHooks),
        );
        let session = Session::new();

        let response = executor.execute(&session, "Hi").await.unwrap();

        assert_eq!(response.text(), "Hello!");
        assert_eq!(response.iterations, 1);
        assert!(!response.has_tool_calls());
        assert_eq!(session.message_count(), 2);
    }

    #[tokio::test]
    async fn test_executor_runs_tool_and_feeds_result_back() {
        let llm = Arc::new(MockLlm::new(vec![
            tool_call_response("E2b_RunCode"),
            CompletionResponse::new("resp-2", "mock", Message::assistant("2+2 is 4")),
        ]));
        let tool = CodeTool::new("E2b_RunCode");
        let hooks = Arc::new(RecordingHooks::default());
        let executor = executor_with(llm.clone(), vec![tool.clone()], hooks.clone());
        let session = Session::new();

        let response = executor.execute(&session, "What is 2+2?").await.unwrap();

        assert_eq!(response.text(), "2+2 is 4");
        assert_eq!(response.iterations, 2);
        assert_eq!(response.tool_calls[0].output, "4");
        assert_eq!(tool.runs.lock().unwrap().len(), 1);

        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(
            session.messages().iter().filter(|m| m.role == Role::User).count(),
            1
        );

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests[0].user.as_deref(), Some("dev@example.com"));
        assert_eq!(requests[1].messages.len(), 3);

        assert_eq!(
            hooks.events(),
            vec![
                "start analyst",
                "tool_start E2b_RunCode",
                "tool_end E2b_RunCode Completed",
                "end analyst",
            ]
        );
    }

    #[tokio::test]
    async fn test_denial_aborts_turn_without_running_tool() {
        let llm = Arc::new(MockLlm::new(vec![tool_call_response("E2b_RunCode")]));
        let tool = CodeTool::new("E2b_RunCode");
        let gated: Arc<dyn Tool> = Arc::new(GatedTool::new(tool.clone(), Arc::new(StaticConfirmer::deny())));
        let hooks = Arc::new(RecordingHooks::default());
        let executor = executor_with(llm.clone(), vec![gated], hooks.clone());
        let session = Session::new();

        let err = executor.execute(&session, "Run it").await.unwrap_err();

        assert!(matches!(err, AgentError::ToolDenied { ref tool_name } if tool_name == "E2b_RunCode"));
        assert!(tool.runs.lock().unwrap().is_empty());
        assert_eq!(llm.requests.lock().unwrap().len(), 1);
        assert_eq!(
            hooks.events(),
            vec![
                "start analyst",
                "tool_start E2b_RunCode",
                "tool_end E2b_RunCode Denied",
            ]
        );
    }

    #[tokio::test]
    async fn test_unreadable_answer_is_a_denial() {
        let llm = Arc::new(MockLlm::new(vec![
            tool_call_response("E2b_RunCode"),
            CompletionResponse::new("resp-2", "mock", Message::assistant("should not be reached")),
        ]));
        let tool = CodeTool::new("E2b_RunCode");
        let confirmer = ConsoleConfirmer::with_reader(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed"))
        });
        let gated: Arc<dyn Tool> = Arc::new(GatedTool::new(tool.clone(), Arc::new(confirmer)));
        let executor = executor_with(llm.clone(), vec![gated], Arc::new(NoopHooks));
        let session = Session::new();

        let err = executor.execute(&session, "Run it").await.unwrap_err();

        assert_eq!(err.denied_tool(), Some("E2b_RunCode"));
        assert!(tool.runs.lock().unwrap().is_empty());
        assert_eq!(llm.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_turn_never_calls_model() {
        let llm = Arc::new(MockLlm::new(vec![]));
        let token = CancellationToken::new();
        token.cancel();
        let executor = executor_with(llm.clone(), vec![], Arc::new(NoopHooks)).with_cancellation(token);

        let result = executor.execute(&Session::new(), "Hi").await;

        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    struct StuckTool {
        def: ToolDefinition,
    }

    #[async_trait]
    impl Tool for StuckTool {
        fn definition(&self) -> &ToolDefinition {
            &self.def
        }

        async fn execute(&self, _ctx: &Context, _input: Value) -> toolgate_tools::Result<ToolOutput> {
            tokio::time::sleep(std::time::Duration::from_secs(30)).await;
            Ok(ToolOutput::text("late"))
        }
    }

    #[tokio::test]
    async fn test_cancel_during_tool_ends_turn() {
        let llm = Arc::new(MockLlm::new(vec![
            tool_call_response("E2b_RunCode"),
            CompletionResponse::new("resp-2", "mock", Message::assistant("should not be reached")),
        ]));
        let stuck: Arc<dyn Tool> = Arc::new(StuckTool {
            def: ToolDefinition::new("E2b_RunCode", "runs code"),
        });
        let token = CancellationToken::new();
        let executor =
            executor_with(llm.clone(), vec![stuck], Arc::new(NoopHooks)).with_cancellation(token.clone());

        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            token.cancel();
        });

        let result = executor.execute(&Session::new(), "Run it").await;

        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert_eq!(llm.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool_becomes_error_result() {
        let llm = Arc::new(MockLlm::new(vec![
            tool_call_response("Missing_Tool"),
            CompletionResponse::new("resp-2", "mock", Message::assistant("That tool does not exist")),
        ]));
        let executor = executor_with(llm, vec![], Arc::new(NoopHooks));
        let session = Session::new();

        let response = executor.execute(&session, "Try it").await.unwrap();

        assert_eq!(response.failed_tool_calls().count(), 1);
        let tool_message = &session.messages()[2];
        assert!(tool_message.tool_results()[0].is_error);
    }

    #[tokio::test]
    async fn test_executor_max_iterations() {
        let llm = Arc::new(MockLlm::new(vec![
            tool_call_response("E2b_RunCode"),
            tool_call_response("E2b_RunCode"),
            tool_call_response("E2b_RunCode"),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(CodeTool::new("E2b_RunCode")).unwrap();
        let executor = Executor::new(
            AgentConfig::new("mock", "You are helpful.").with_max_iterations(2),
            llm,
            Some(Arc::new(ToolExecutor::new(Arc::new(registry)))),
            Arc::new(NoopHooks),
        );

        let result = executor.execute(&Session::new(), "Hi").await;

        assert!(matches!(result, Err(AgentError::MaxIterationsReached(2))));
    }
}

use async_trait::async_trait;
use colored::Colorize;
use std::sync::atomic::{AtomicUsize, Ordering};
use toolgate_agent::AgentHooks;
use toolgate_core::ToolCall;

/// Prints one numbered line per agent lifecycle event.
pub struct ConsoleHooks {
    display_name: String,
    counter: AtomicUsize,
}

impl ConsoleHooks {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            counter: AtomicUsize::new(0),
        }
    }

    fn line(&self, event: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("### ({}) {}: {}", self.display_name, n, event)
    }

    fn emit(&self, event: String) {
        println!("{}", self.line(&event).dimmed());
    }
}

#[async_trait]
impl AgentHooks for ConsoleHooks {
    async fn on_start(&self, agent: &str) {
        self.emit(format!("Agent {} started", agent));
    }

    async fn on_end(&self, agent: &str, _output: &str) {
        self.emit(format!("Agent {} ended", agent));
    }

    async fn on_tool_start(&self, agent: &str, call: &ToolCall) {
        self.emit(format!("Agent {} started tool {}", agent, call.name));
    }

    async fn on_tool_end(&self, agent: &str, call: &ToolCall) {
        self.emit(format!("Agent {} ended tool {}", agent, call.name));
    }
}

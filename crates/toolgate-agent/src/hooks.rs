use async_trait::async_trait;
use toolgate_core::ToolCall;

/// Lifecycle callbacks fired by the agent loop. Every method defaults to a no-op.
#[async_trait]
pub trait AgentHooks: Send + Sync {
    async fn on_start(&self, _agent: &str) {}

    async fn on_end(&self, _agent: &str, _output: &str) {}

    async fn on_tool_start(&self, _agent: &str, _call: &ToolCall) {}

    /// `call` is in a terminal state: completed, failed or denied.
    async fn on_tool_end(&self, _agent: &str, _call: &ToolCall) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl AgentHooks for NoopHooks {}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records each hook invocation as a short string.
    #[derive(Default)]
    pub struct RecordingHooks {
        events: Mutex<Vec<String>>,
    }

    impl RecordingHooks {
        pub fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl AgentHooks for RecordingHooks {
        async fn on_start(&self, agent: &str) {
            self.push(format!("start {}", agent));
        }

        async fn on_end(&self, agent: &str, _output: &str) {
            self.push(format!("end {}", agent));
        }

        async fn on_tool_start(&self, _agent: &str, call: &ToolCall) {
            self.push(format!("tool_start {}", call.name));
        }

        async fn on_tool_end(&self, _agent: &str, call: &ToolCall) {
            self.push(format!("tool_end {} {:?}", call.name, call.status));
        }
    }
}

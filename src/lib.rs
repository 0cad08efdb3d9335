//! Umbrella crate re-exporting the toolgate workspace.

pub use toolgate_agent as agent;
pub use toolgate_core as core;
pub use toolgate_llm as llm;
pub use toolgate_tools as tools;

pub use toolgate_agent::{Agent, AgentBuilder, AgentError, Session};
pub use toolgate_tools::{ConsoleConfirmer, RemoteToolClient, ToolGate};

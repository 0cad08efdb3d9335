pub mod error;
pub mod config;
pub mod hooks;
pub mod session;
pub mod response;
pub mod executor;
pub mod agent;

pub use error::{AgentError, Result};
pub use config::AgentConfig;
pub use hooks::{AgentHooks, NoopHooks};
pub use session::{Session, SessionStats};
pub use response::{AgentResponse, ToolCallRecord};
pub use executor::Executor;
pub use agent::{Agent, AgentBuilder};

pub mod prelude {
    pub use crate::error::{AgentError, Result};
    pub use crate::config::AgentConfig;
    pub use crate::hooks::{AgentHooks, NoopHooks};
    pub use crate::session::{Session, SessionStats};
    pub use crate::response::{AgentResponse, ToolCallRecord};
    pub use crate::agent::{Agent, AgentBuilder};
}

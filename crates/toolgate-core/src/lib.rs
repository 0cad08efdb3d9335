pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod tool;
pub mod types;
pub mod utils;

pub use config::Config;
pub use context::Context;
pub use error::{Error, Result};
pub use message::{ContentBlock, Message, MessageBuilder, Role};
pub use tool::{ToolCall, ToolCallStatus, ToolDefinition};
pub use types::{Id, MessageId, Metadata, RequestId, SessionId, Timestamp};

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::context::Context;
    pub use crate::error::{Error, Result, ResultExt};
    pub use crate::message::{ContentBlock, Message, MessageBuilder, Role};
    pub use crate::tool::{ToolCall, ToolCallStatus, ToolDefinition};
    pub use crate::types::{Id, MessageId, Metadata, RequestId, SessionId, Timestamp};
}

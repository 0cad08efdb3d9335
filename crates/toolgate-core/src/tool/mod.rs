mod call;
mod schema;

pub use call::{ToolCall, ToolCallStatus};
pub use schema::ToolDefinition;

mod client;
mod tool;
mod types;

pub use client::{AuthorizationNotifier, RemoteToolClient};
pub use tool::{render_output, RemoteTool};
pub use types::{
    AuthorizationResponse, AuthorizationStatus, ExecuteToolResponse, FormattedFunction,
    FormattedTool, ToolExecutionError, ToolExecutionOutput,
};

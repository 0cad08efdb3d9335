pub mod error;
pub mod executor;
pub mod gate;
pub mod registry;
pub mod remote;
pub mod traits;

pub use error::{Result, ToolError};
pub use executor::ToolExecutor;
pub use gate::{
    confirm_tool_usage, ConfirmationRequest, Confirmer, ConsoleConfirmer, Decision, GatedTool,
    StaticConfirmer, ToolGate,
};
pub use registry::ToolRegistry;
pub use traits::{Artifact, Tool, ToolOutput};

pub use remote::{
    AuthorizationNotifier, AuthorizationResponse, AuthorizationStatus, RemoteTool, RemoteToolClient,
};

pub mod prelude {
    pub use crate::error::{Result, ToolError};
    pub use crate::executor::ToolExecutor;
    pub use crate::gate::{Confirmer, ConsoleConfirmer, Decision, StaticConfirmer, ToolGate};
    pub use crate::registry::ToolRegistry;
    pub use crate::traits::{Artifact, Tool, ToolOutput};

    pub use crate::remote::{RemoteTool, RemoteToolClient};
}

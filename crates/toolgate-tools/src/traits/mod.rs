mod tool;

pub use tool::{Artifact, Tool, ToolOutput};

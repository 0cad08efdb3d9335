mod content;
mod message;
mod role;

pub use content::*;
pub use message::{Message, MessageBuilder};
pub use role::Role;

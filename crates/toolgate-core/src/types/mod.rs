mod id;
mod metadata;
mod timestamp;

pub use id::*;
pub use metadata::Metadata;
pub use timestamp::Timestamp;

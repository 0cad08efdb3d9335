use thiserror::Error;

pub mod codes {
    pub const CONFIG_INVALID: &str = "E1001";
    pub const CONFIG_MISSING: &str = "E1002";
    pub const VALIDATION_FAILED: &str = "E2001";
    pub const INVALID_INPUT: &str = "E2002";
    pub const NOT_FOUND: &str = "E3001";
    pub const CANCELLED: &str = "E4001";
    pub const TIMEOUT: &str = "E4002";
    pub const NOT_PERMITTED: &str = "E4003";
    pub const INTERNAL: &str = "E9001";
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required config: {0}. Add it to your .env file.")]
    MissingConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error("Not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timeout after {0}ms")]
    Timeout(u64),

    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => codes::CONFIG_INVALID,
            Error::MissingConfig(_) => codes::CONFIG_MISSING,
            Error::Json(_) => codes::VALIDATION_FAILED,
            Error::Io(_) => codes::INTERNAL,
            Error::Validation(_) => codes::VALIDATION_FAILED,
            Error::InvalidInput { .. } => codes::INVALID_INPUT,
            Error::NotFound { .. } => codes::NOT_FOUND,
            Error::Cancelled => codes::CANCELLED,
            Error::Timeout(_) => codes::TIMEOUT,
            Error::NotPermitted(_) => codes::NOT_PERMITTED,
            Error::Internal(_) => codes::INTERNAL,
            Error::Other(_) => codes::INTERNAL,
        }
    }

    pub fn missing_config(name: impl Into<String>) -> Self {
        Self::MissingConfig(name.into())
    }

    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub trait ResultExt<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Internal(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_message() {
        let err = Error::missing_config("ARCADE_USER_ID");
        assert_eq!(err.code(), codes::CONFIG_MISSING);
        assert_eq!(
            err.to_string(),
            "Missing required config: ARCADE_USER_ID. Add it to your .env file."
        );
    }

    #[test]
    fn test_with_context() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = res.with_context(|| "reading prompt".to_string()).unwrap_err();
        assert!(err.to_string().contains("reading prompt"));
    }
}

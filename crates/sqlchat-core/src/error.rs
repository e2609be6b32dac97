use thiserror::Error;

/// Top-level error type for the sqlchat system.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for SqlChatError` so that the `?` operator works
/// across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqlChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    #[error("Execution error: {0}")]
    Execution(String),
}

impl From<toml::de::Error> for SqlChatError {
    fn from(err: toml::de::Error) -> Self {
        SqlChatError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SqlChatError {
    fn from(err: toml::ser::Error) -> Self {
        SqlChatError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SqlChatError {
    fn from(err: serde_json::Error) -> Self {
        SqlChatError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for sqlchat operations.
pub type Result<T> = std::result::Result<T, SqlChatError>;

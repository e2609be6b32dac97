//! Error types for the conversational interface.

use sqlchat_core::error::SqlChatError;
use sqlchat_warehouse::WarehouseError;

/// Errors from a chat turn.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("generation failed with status {status}: {body}")]
    Generation { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
    #[error("execution error: {0}")]
    Execution(#[from] WarehouseError),
    #[error("prompt error: {0}")]
    Prompt(String),
}

impl ChatError {
    /// Whether a retry of the model call has a chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            ChatError::Transport(e) => e.is_timeout() || e.is_connect(),
            ChatError::Generation { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<SqlChatError> for ChatError {
    fn from(err: SqlChatError) -> Self {
        ChatError::Prompt(err.to_string())
    }
}

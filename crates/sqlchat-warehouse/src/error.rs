//! Error types for warehouse execution.

use sqlchat_core::error::SqlChatError;

/// Errors from executing a query against a warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("warehouse returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("SQLite error: {0}")]
    Sqlite(String),
    #[error("invalid warehouse response: {0}")]
    Decode(String),
    #[error("query job did not complete before the timeout")]
    Incomplete,
}

impl WarehouseError {
    /// Whether repeating the same request has a chance of succeeding.
    ///
    /// `Incomplete` is not transient: resubmitting would start a new job.
    /// Running jobs are polled instead.
    pub fn is_transient(&self) -> bool {
        match self {
            WarehouseError::Http(e) => e.is_timeout() || e.is_connect(),
            WarehouseError::Status { status, .. } => *status == 429 || *status >= 500,
            WarehouseError::Incomplete
            | WarehouseError::Sqlite(_)
            | WarehouseError::Decode(_) => false,
        }
    }
}

impl From<rusqlite::Error> for WarehouseError {
    fn from(err: rusqlite::Error) -> Self {
        WarehouseError::Sqlite(err.to_string())
    }
}

impl From<WarehouseError> for SqlChatError {
    fn from(err: WarehouseError) -> Self {
        SqlChatError::Execution(err.to_string())
    }
}

pub mod config;
pub mod error;
pub mod retry;
pub mod safety;
pub mod types;

pub use config::SqlChatConfig;
pub use error::{Result, SqlChatError};
pub use retry::RetryPolicy;
pub use safety::{is_safe, KeywordValidator, QueryValidator, SafetyDecision};
pub use types::*;

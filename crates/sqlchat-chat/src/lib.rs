//! Conversational natural-language-to-SQL interface.
//!
//! Keeps a bounded conversation history, asks a generative model to turn
//! questions into SQL, gates the SQL through the safety validator, runs it
//! on a warehouse, and summarizes the result.

pub mod context;
pub mod error;
pub mod generator;
pub mod llm;
pub mod orchestrator;
pub mod prompt;
pub mod response;

pub use context::{Conversation, ConversationHistory, DEFAULT_MAX_HISTORY};
pub use error::ChatError;
pub use generator::{clean_sql, SqlGenerator};
pub use llm::{CompletionClient, Content, ContentRole, Part, VertexClient};
pub use orchestrator::{ChatOrchestrator, TurnOutcome};
pub use prompt::PromptBuilder;
pub use response::Summarizer;

//! Chat orchestrator: drives one question through generation, the safety
//! gate, execution, and summarization.
//!
//! The orchestrator never prints; everything the caller shows the user is
//! carried in [`TurnOutcome`].

use std::sync::Arc;

use tracing::{info, warn};

use sqlchat_core::config::ChatConfig;
use sqlchat_core::safety::{QueryValidator, SafetyDecision};
use sqlchat_core::types::Role;
use sqlchat_warehouse::{QueryResult, Warehouse};

use crate::context::Conversation;
use crate::error::ChatError;
use crate::generator::SqlGenerator;
use crate::response::Summarizer;

const NO_QUERY_MESSAGE: &str = "I couldn't generate a valid SQL query for that question.";
const REFUSED_MESSAGE: &str = "I can only generate SELECT queries for data analysis.";
const EXECUTION_FAILED_MESSAGE: &str = "I couldn't run that query against the warehouse.";

/// Result of a single turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The query ran. `summary` holds the error text when summarization
    /// failed.
    Answered {
        sql: String,
        result: QueryResult,
        summary: Result<String, String>,
    },
    /// The safety gate rejected the candidate. Nothing was executed.
    Refused { sql: String, reason: String },
    /// The model produced no SQL.
    NoQuery,
}

/// Coordinates the components that make up a chat turn.
pub struct ChatOrchestrator {
    config: ChatConfig,
    generator: SqlGenerator,
    validator: Box<dyn QueryValidator>,
    warehouse: Arc<dyn Warehouse>,
    summarizer: Summarizer,
}

impl ChatOrchestrator {
    pub fn new(
        config: ChatConfig,
        generator: SqlGenerator,
        validator: Box<dyn QueryValidator>,
        warehouse: Arc<dyn Warehouse>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            config,
            generator,
            validator,
            warehouse,
            summarizer,
        }
    }

    /// Start a session sized by the configured history bound.
    pub fn new_conversation(&self) -> Conversation {
        Conversation::new(self.config.max_history)
    }

    /// Handle one user question.
    ///
    /// Invalid input is rejected before the conversation is touched. A
    /// refused query is an `Ok` outcome; generation and execution failures
    /// are returned as errors after an explanatory assistant message has
    /// been recorded.
    pub async fn handle_turn(
        &self,
        conversation: &mut Conversation,
        question: &str,
    ) -> Result<TurnOutcome, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if question.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        let turn = conversation.begin_turn();
        info!(conversation = %conversation.id, turn, "Handling question");
        conversation.record(Role::User, question);

        let sql = match self
            .generator
            .generate_sql(question, conversation.history())
            .await
        {
            Ok(sql) => sql,
            Err(e) => {
                warn!(error = %e, "SQL generation failed");
                conversation.record(Role::Assistant, NO_QUERY_MESSAGE);
                return Err(e);
            }
        };
        if sql.is_empty() {
            conversation.record(Role::Assistant, NO_QUERY_MESSAGE);
            return Ok(TurnOutcome::NoQuery);
        }

        if let SafetyDecision::Deny { reason } = self.validator.check(&sql) {
            warn!(%reason, "Generated SQL refused");
            conversation.record(Role::Assistant, REFUSED_MESSAGE);
            return Ok(TurnOutcome::Refused { sql, reason });
        }

        let result = match self.warehouse.execute(&sql).await {
            Ok(result) => result,
            Err(e) => {
                warn!(warehouse = self.warehouse.name(), error = %e, "Query execution failed");
                conversation.record(Role::Assistant, EXECUTION_FAILED_MESSAGE);
                return Err(ChatError::Execution(e));
            }
        };
        info!(rows = result.len(), warehouse = self.warehouse.name(), "Query executed");

        let summary = self
            .summarizer
            .summarize(question, &result)
            .await
            .map_err(|e| {
                warn!(error = %e, "Summary generation failed");
                summary_error_text(&e)
            });

        conversation.record(Role::Assistant, format!("SQL Result: {}", result.to_json()));

        Ok(TurnOutcome::Answered {
            sql,
            result,
            summary,
        })
    }
}

fn summary_error_text(error: &ChatError) -> String {
    match error {
        ChatError::Generation { status, body } => format!("Summary Error ({}): {}", status, body),
        other => format!("Summary Error: {}", other),
    }
}

// =============================================================================
// Tests
// =============================================================================

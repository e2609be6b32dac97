//! Plain-language summaries of query results.

use std::sync::Arc;

use tracing::debug;

use sqlchat_warehouse::QueryResult;

use crate::error::ChatError;
use crate::llm::CompletionClient;
use crate::prompt::PromptBuilder;

/// Asks the model to describe a query result in a sentence or two.
pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    prompt: PromptBuilder,
}

impl Summarizer {
    pub fn new(client: Arc<dyn CompletionClient>, prompt: PromptBuilder) -> Self {
        Self { client, prompt }
    }

    /// Summarize `result` as an answer to `question`.
    pub async fn summarize(&self, question: &str, result: &QueryResult) -> Result<String, ChatError> {
        let contents = self.prompt.summary_contents(question, result);
        let text = self.client.complete(&contents).await?;
        debug!(rows = result.len(), "Summary received");
        Ok(text.trim().to_string())
    }
}

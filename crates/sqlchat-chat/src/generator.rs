//! Natural-language to SQL generation.

use std::sync::Arc;

use tracing::debug;

use crate::context::ConversationHistory;
use crate::error::ChatError;
use crate::llm::CompletionClient;
use crate::prompt::PromptBuilder;

/// Turns a question plus conversation context into a candidate SQL string.
///
/// The candidate is not checked for safety here.
pub struct SqlGenerator {
    client: Arc<dyn CompletionClient>,
    prompt: PromptBuilder,
}

impl SqlGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, prompt: PromptBuilder) -> Self {
        Self { client, prompt }
    }

    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// Ask the model for SQL answering `question`.
    ///
    /// Returns the cleaned candidate, which may be empty.
    pub async fn generate_sql(
        &self,
        question: &str,
        history: &ConversationHistory,
    ) -> Result<String, ChatError> {
        let contents = self.prompt.sql_contents(question, history);
        let raw = self.client.complete(&contents).await?;
        let sql = clean_sql(&raw);
        debug!(chars = sql.len(), "Generated SQL candidate");
        Ok(sql)
    }
}

/// Strip surrounding whitespace and Markdown code fences from model output.
pub fn clean_sql(raw: &str) -> String {
    let text = raw.trim();
    let text = text
        .strip_prefix("```sql")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sqlchat_core::config::SqlChatConfig;
    use sqlchat_core::types::{Role, SchemaDescriptor};

    use crate::llm::{Content, ContentRole};

    /// Replies with a fixed string and remembers what it was sent.
    struct FixedClient {
        reply: String,
        seen: Mutex<Vec<Vec<Content>>>,
    }

    impl FixedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(&self, contents: &[Content]) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(contents.to_vec());
            Ok(self.reply.clone())
        }
    }

    fn generator(client: Arc<FixedClient>) -> SqlGenerator {
        let prompt =
            PromptBuilder::from_config(&SqlChatConfig::default(), &SchemaDescriptor::shopping())
                .unwrap();
        SqlGenerator::new(client, prompt)
    }

    // ---- clean_sql ----

    #[test]
    fn test_clean_sql_fenced_matches_unfenced() {
        let plain = "SELECT Location FROM t";
        assert_eq!(clean_sql(plain), plain);
        assert_eq!(clean_sql("```sql\nSELECT Location FROM t\n```"), plain);
        assert_eq!(clean_sql("  ```sql SELECT Location FROM t ```  "), plain);
    }

    #[test]
    fn test_clean_sql_bare_fence() {
        assert_eq!(clean_sql("```\nSELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_clean_sql_only_trailing_fence() {
        assert_eq!(clean_sql("SELECT 1\n```"), "SELECT 1");
    }

    #[test]
    fn test_clean_sql_empty_fence() {
        assert_eq!(clean_sql("```sql\n```"), "");
        assert_eq!(clean_sql("   "), "");
    }

    #[test]
    fn test_clean_sql_keeps_inner_text() {
        assert_eq!(
            clean_sql("```sql\nSELECT 'a```b' AS x\n```"),
            "SELECT 'a```b' AS x"
        );
    }

    // ---- generate_sql ----

    #[tokio::test]
    async fn test_generate_sql_cleans_reply() {
        let client = FixedClient::new("```sql\nSELECT AVG(`Purchase Amount `) FROM t\n```\n");
        let gen = generator(Arc::clone(&client));
        let sql = gen
            .generate_sql("Average spend?", &ConversationHistory::default())
            .await
            .unwrap();
        assert_eq!(sql, "SELECT AVG(`Purchase Amount `) FROM t");
    }

    #[tokio::test]
    async fn test_generate_sql_sends_context_and_question() {
        let client = FixedClient::new("SELECT 1");
        let gen = generator(Arc::clone(&client));
        let mut history = ConversationHistory::default();
        history.append(Role::User, "Which locations spend most?");
        gen.generate_sql("And the least?", &history).await.unwrap();

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let contents = &seen[0];
        assert_eq!(contents[0].role, ContentRole::Model);
        assert!(contents[0].parts[0]
            .text
            .contains("user: Which locations spend most?"));
        assert_eq!(contents[1].parts[0].text, "And the least?");
    }

    #[tokio::test]
    async fn test_generate_sql_returns_unsafe_candidate_unchanged() {
        let client = FixedClient::new("DROP TABLE shopping");
        let gen = generator(client);
        let sql = gen
            .generate_sql("delete everything", &ConversationHistory::default())
            .await
            .unwrap();
        assert_eq!(sql, "DROP TABLE shopping");
    }
}

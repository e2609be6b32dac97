//! Prompt construction for SQL generation and result summaries.

use sqlchat_core::config::{SqlChatConfig, WarehouseBackend};
use sqlchat_core::types::{ExampleQuery, SchemaDescriptor};
use sqlchat_warehouse::QueryResult;

use crate::context::ConversationHistory;
use crate::error::ChatError;
use crate::llm::{Content, ContentRole};

/// Builds the model prompts for a fixed schema and example set.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    backend: WarehouseBackend,
    project: String,
    dataset: String,
    table: String,
    schema_json: String,
    notes: Vec<String>,
    examples: Vec<ExampleQuery>,
}

impl PromptBuilder {
    /// Create a builder for `schema` with the given worked examples.
    pub fn new(
        backend: WarehouseBackend,
        project: impl Into<String>,
        dataset: impl Into<String>,
        schema: &SchemaDescriptor,
        examples: Vec<ExampleQuery>,
    ) -> Result<Self, ChatError> {
        let notes = schema
            .columns
            .iter()
            .filter(|c| c.column_type.eq_ignore_ascii_case("BOOLEAN"))
            .map(|c| {
                format!(
                    "Note: The column '{}' is of BOOLEAN type. Use TRUE/FALSE without quotes in SQL.",
                    c.name
                )
            })
            .collect();

        Ok(Self {
            backend,
            project: project.into(),
            dataset: dataset.into(),
            table: schema.table.clone(),
            schema_json: schema.to_pretty_json()?,
            notes,
            examples,
        })
    }

    /// Builder for the configured warehouse with the default shopping examples.
    pub fn from_config(config: &SqlChatConfig, schema: &SchemaDescriptor) -> Result<Self, ChatError> {
        let table_ref = config.warehouse.table_reference();
        Self::new(
            config.warehouse.backend,
            config.warehouse.project.clone(),
            config.warehouse.dataset.clone(),
            schema,
            ExampleQuery::shopping_defaults(&table_ref),
        )
    }

    /// The instruction block sent ahead of the user's question.
    pub fn sql_prompt(&self, history: &ConversationHistory) -> String {
        let mut examples = String::new();
        for note in &self.notes {
            examples.push_str(note);
            examples.push('\n');
        }
        for example in &self.examples {
            examples.push_str(&format!("Q: {}\nA:\n{}\n\n", example.question, example.sql));
        }

        let location = match self.backend {
            WarehouseBackend::Bigquery => format!(
                "Project: {}\nDataset: {}\nTable: {}",
                self.project, self.dataset, self.table
            ),
            WarehouseBackend::Sqlite => format!("Table: {}", self.table),
        };

        format!(
            "\nYou are a SQL expert helping with {engine}. Here's the schema and examples to guide your query generation.\n\n\
             {location}\n\n\
             Schema:\n{schema}\n\n\n\
             Examples:\n{examples}\
             Context:\n{context}\n\n\
             User's Question:\n",
            engine = self.backend.engine_name(),
            location = location,
            schema = self.schema_json,
            examples = examples,
            context = history.render(),
        )
    }

    /// Request contents for SQL generation: instructions as the model turn,
    /// the question as the user turn.
    pub fn sql_contents(&self, question: &str, history: &ConversationHistory) -> Vec<Content> {
        vec![
            Content::text(ContentRole::Model, self.sql_prompt(history)),
            Content::text(ContentRole::User, question),
        ]
    }

    /// The summary request for a question and its query result.
    pub fn summary_prompt(&self, question: &str, result: &QueryResult) -> String {
        format!(
            "\nYou are a data assistant. Given a user question and the JSON result of a {engine} query, create a clear and friendly English summary.\n\n\
             User Question:\n{question}\n\n\
             Query Result:\n{result}\n\n\
             Short response:\n",
            engine = self.backend.engine_name(),
            question = question,
            result = result.to_json(),
        )
    }

    /// Request contents for a summary: a single user turn.
    pub fn summary_contents(&self, question: &str, result: &QueryResult) -> Vec<Content> {
        vec![Content::text(
            ContentRole::User,
            self.summary_prompt(question, result),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlchat_core::config::WarehouseBackend;
    use sqlchat_core::types::Role;

    fn builder() -> PromptBuilder {
        PromptBuilder::from_config(&SqlChatConfig::default(), &SchemaDescriptor::shopping())
            .unwrap()
    }

    #[test]
    fn test_sql_prompt_sections_in_order() {
        let prompt = builder().sql_prompt(&ConversationHistory::default());
        let positions: Vec<usize> = [
            "You are a SQL expert",
            "Project: light-moon-455005-g5",
            "Dataset: shopping",
            "Table: shopping",
            "Schema:",
            "Examples:",
            "Context:",
            "User's Question:",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_sql_prompt_embeds_schema_and_examples() {
        let prompt = builder().sql_prompt(&ConversationHistory::default());
        assert!(prompt.contains("\"name\": \"Purchase Amount \""));
        assert!(prompt.contains("Q: Locations with highest avg spend?"));
        assert!(prompt.contains("FROM `light-moon-455005-g5.shopping.shopping`"));
        assert!(prompt.contains(
            "Note: The column 'Subscription Status' is of BOOLEAN type. Use TRUE/FALSE without quotes in SQL."
        ));
    }

    #[test]
    fn test_sql_prompt_embeds_history() {
        let mut history = ConversationHistory::default();
        history.append(Role::User, "Which season sells most?");
        history.append(Role::Assistant, "SQL Result: [{\"Season\":\"Spring\"}]");
        let prompt = builder().sql_prompt(&history);
        assert!(prompt.contains(
            "Context:\nuser: Which season sells most?\nassistant: SQL Result: [{\"Season\":\"Spring\"}]\n"
        ));
    }

    #[test]
    fn test_sql_contents_roles() {
        let contents = builder().sql_contents("How many customers?", &ConversationHistory::default());
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].role, ContentRole::Model);
        assert_eq!(contents[1].role, ContentRole::User);
        assert_eq!(contents[1].parts[0].text, "How many customers?");
    }

    #[test]
    fn test_sqlite_backend_uses_bare_table() {
        let mut config = SqlChatConfig::default();
        config.warehouse.backend = WarehouseBackend::Sqlite;
        let prompt = PromptBuilder::from_config(&config, &SchemaDescriptor::shopping())
            .unwrap()
            .sql_prompt(&ConversationHistory::default());
        assert!(prompt.contains("FROM shopping\n"));
        assert!(!prompt.contains("`light-moon-455005-g5.shopping.shopping`"));
    }

    #[test]
    fn test_sqlite_backend_names_sqlite_engine() {
        let mut config = SqlChatConfig::default();
        config.warehouse.backend = WarehouseBackend::Sqlite;
        let builder = PromptBuilder::from_config(&config, &SchemaDescriptor::shopping()).unwrap();

        let prompt = builder.sql_prompt(&ConversationHistory::default());
        assert!(prompt.contains("You are a SQL expert helping with SQLite."));
        assert!(prompt.contains("Table: shopping\n"));
        assert!(!prompt.contains("BigQuery"));
        assert!(!prompt.contains("Project:"));
        assert!(!prompt.contains("Dataset:"));

        let summary = builder.summary_prompt("How many rows?", &QueryResult::default());
        assert!(summary.contains("the JSON result of a SQLite query"));
        assert!(!summary.contains("BigQuery"));
    }

    #[test]
    fn test_no_boolean_columns_no_notes() {
        let schema = SchemaDescriptor {
            table: "t".to_string(),
            columns: vec![],
        };
        let prompt = PromptBuilder::new(WarehouseBackend::Bigquery, "p", "d", &schema, vec![])
            .unwrap()
            .sql_prompt(&ConversationHistory::default());
        assert!(!prompt.contains("BOOLEAN type"));
        assert!(prompt.contains("Table: t"));
    }

    #[test]
    fn test_summary_prompt() {
        let result: QueryResult = serde_json::from_value(serde_json::json!({
            "columns": ["avg_spent"],
            "rows": [{"avg_spent": 59.5}]
        }))
        .unwrap();
        let contents = builder().summary_contents("Average spend?", &result);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, ContentRole::User);
        let text = &contents[0].parts[0].text;
        assert!(text.contains("the JSON result of a BigQuery query"));
        assert!(text.contains("User Question:\nAverage spend?"));
        assert!(text.contains("Query Result:\n[{\"avg_spent\":59.5}]"));
        assert!(text.ends_with("Short response:\n"));
    }
}

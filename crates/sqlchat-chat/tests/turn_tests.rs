//! End-to-end chat turns against an in-memory SQLite warehouse.
//!
//! The model is replaced by a scripted client; everything else (prompt
//! building, cleaning, the keyword gate, execution and context tracking)
//! is the real implementation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use sqlchat_chat::{
    ChatError, ChatOrchestrator, CompletionClient, Content, ContentRole, PromptBuilder,
    SqlGenerator, Summarizer, TurnOutcome,
};
use sqlchat_core::config::{SqlChatConfig, WarehouseBackend};
use sqlchat_core::types::{Role, SchemaDescriptor};
use sqlchat_core::KeywordValidator;
use sqlchat_warehouse::{SqliteWarehouse, Warehouse};

// =============================================================================
// Helpers
// =============================================================================

struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<Content>>>,
}

impl ScriptedModel {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Vec<Content>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedModel {
    async fn complete(&self, contents: &[Content]) -> Result<String, ChatError> {
        self.requests.lock().unwrap().push(contents.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatError::MalformedResponse("no scripted reply".to_string()))
    }
}

fn shopping_db() -> Arc<SqliteWarehouse> {
    let wh = SqliteWarehouse::in_memory().unwrap();
    wh.execute_batch(
        "CREATE TABLE shopping (
             `Customer ID` INTEGER,
             Age INTEGER,
             Location TEXT,
             Season TEXT,
             `Purchase Amount ` INTEGER,
             `Subscription Status` BOOLEAN
         );
         INSERT INTO shopping VALUES (1, 25, 'Montana', 'Spring', 80, 1);
         INSERT INTO shopping VALUES (2, 41, 'Montana', 'Winter', 60, 0);
         INSERT INTO shopping VALUES (3, 33, 'Kansas', 'Spring', 20, 1);
         INSERT INTO shopping VALUES (4, 52, 'Kansas', 'Fall', 40, 0);",
    )
    .unwrap();
    Arc::new(wh)
}

fn build(model: Arc<ScriptedModel>, warehouse: Arc<SqliteWarehouse>) -> ChatOrchestrator {
    let mut config = SqlChatConfig::default();
    config.warehouse.backend = WarehouseBackend::Sqlite;
    let prompt = PromptBuilder::from_config(&config, &SchemaDescriptor::shopping()).unwrap();
    ChatOrchestrator::new(
        config.chat.clone(),
        SqlGenerator::new(model.clone(), prompt.clone()),
        Box::new(KeywordValidator::new(config.safety.clone())),
        warehouse,
        Summarizer::new(model, prompt),
    )
}

// =============================================================================
// Turns
// =============================================================================

#[tokio::test]
async fn test_average_spend_for_subscribers() {
    let model = ScriptedModel::new(&[
        "```sql\nSELECT AVG(`Purchase Amount `) AS avg_spent FROM shopping WHERE `Subscription Status` = TRUE\n```",
        "Subscribers spend $50 on average.",
    ]);
    let orch = build(model.clone(), shopping_db());
    let mut conversation = orch.new_conversation();

    let outcome = orch
        .handle_turn(&mut conversation, "What do subscribers spend on average?")
        .await
        .unwrap();

    let TurnOutcome::Answered { sql, result, summary } = outcome else {
        panic!("expected an answer");
    };
    assert!(sql.starts_with("SELECT AVG("));
    assert_eq!(result.rows[0]["avg_spent"], json!(50.0));
    assert_eq!(summary.as_deref(), Ok("Subscribers spend $50 on average."));

    let requests = model.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0][0].role, ContentRole::Model);
    assert!(requests[0][0].parts[0].text.contains("Table: shopping"));
    assert!(requests[0][0].parts[0].text.contains("helping with SQLite"));
    assert!(requests[1][0].parts[0].text.contains("[{\"avg_spent\":50.0}]"));
    assert!(requests[1][0].parts[0].text.contains("result of a SQLite query"));
}

#[tokio::test]
async fn test_follow_up_sees_previous_result() {
    let model = ScriptedModel::new(&[
        "SELECT Location, SUM(`Purchase Amount `) AS total FROM shopping GROUP BY Location ORDER BY total DESC LIMIT 1",
        "Montana leads.",
        "SELECT Season, COUNT(*) AS n FROM shopping WHERE Location = 'Montana' GROUP BY Season ORDER BY Season",
        "Spring and Winter each have one purchase.",
    ]);
    let orch = build(model.clone(), shopping_db());
    let mut conversation = orch.new_conversation();

    orch.handle_turn(&mut conversation, "Which location spends the most?")
        .await
        .unwrap();
    let outcome = orch
        .handle_turn(&mut conversation, "What seasons do they buy in?")
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Answered { result, .. } => {
            assert_eq!(result.len(), 2);
            assert_eq!(result.rows[0]["Season"], json!("Spring"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    // The second SQL request carries the first turn in its context block.
    let second_sql_request = &model.requests()[2];
    let meta = &second_sql_request[0].parts[0].text;
    assert!(meta.contains("user: Which location spends the most?"));
    assert!(meta.contains("assistant: SQL Result: [{\"Location\":\"Montana\",\"total\":140}]"));

    let roles: Vec<Role> = conversation.history().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn test_destructive_candidate_leaves_table_intact() {
    let model = ScriptedModel::new(&["DROP TABLE shopping"]);
    let warehouse = shopping_db();
    let orch = build(model, warehouse.clone());
    let mut conversation = orch.new_conversation();

    let outcome = orch
        .handle_turn(&mut conversation, "Remove all the data")
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Refused { .. }));

    let count = warehouse
        .execute("SELECT COUNT(*) AS n FROM shopping")
        .await
        .unwrap();
    assert_eq!(count.rows[0]["n"], json!(4));
}

#[tokio::test]
async fn test_bad_column_surfaces_execution_error() {
    let model = ScriptedModel::new(&["SELECT TotalSpend FROM shopping"]);
    let orch = build(model, shopping_db());
    let mut conversation = orch.new_conversation();

    let err = orch
        .handle_turn(&mut conversation, "Total spend?")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Execution(_)));
    assert_eq!(conversation.history().len(), 2);
}

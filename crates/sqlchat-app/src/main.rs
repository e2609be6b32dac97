//! sqlchat binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Resolve the schema descriptor and access token
//! 3. Build the model client, warehouse and orchestrator
//! 4. Answer a single `--question`, or run the interactive session

mod cli;
mod credentials;
mod session;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;

use sqlchat_chat::{
    ChatOrchestrator, CompletionClient, PromptBuilder, SqlGenerator, Summarizer, VertexClient,
};
use sqlchat_core::config::{SqlChatConfig, WarehouseBackend};
use sqlchat_core::{KeywordValidator, SchemaDescriptor};
use sqlchat_warehouse::{BigQueryWarehouse, SqliteWarehouse, Warehouse};

use cli::CliArgs;

fn build_warehouse(
    config: &SqlChatConfig,
    token: &str,
) -> Result<Arc<dyn Warehouse>, Box<dyn std::error::Error>> {
    let warehouse: Arc<dyn Warehouse> = match config.warehouse.backend {
        WarehouseBackend::Bigquery => Arc::new(BigQueryWarehouse::new(&config.warehouse, token)?),
        WarehouseBackend::Sqlite => Arc::new(SqliteWarehouse::open(Path::new(
            &config.warehouse.sqlite_path,
        ))?),
    };
    tracing::info!(warehouse = warehouse.name(), "Warehouse ready");
    Ok(warehouse)
}

fn load_schema(config: &SqlChatConfig) -> Result<SchemaDescriptor, Box<dyn std::error::Error>> {
    match config.prompt.schema_path {
        Some(ref path) => Ok(SchemaDescriptor::load(Path::new(path))?),
        None => Ok(SchemaDescriptor::shopping()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config = args.load_config()?;

    // Tracing (stderr keeps answers on stdout clean).
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting sqlchat v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %args.resolve_config_path().display(), "Configuration resolved");

    // Schema and credentials.
    let schema = load_schema(&config)?;
    let token = match credentials::resolve_access_token(&config.model) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(error = %e, "No access token available");
            return Err(e.into());
        }
    };

    // Components.
    let client: Arc<dyn CompletionClient> = Arc::new(VertexClient::new(&config.model, token.as_str())?);
    let warehouse = build_warehouse(&config, &token)?;
    let prompt = PromptBuilder::from_config(&config, &schema)?;
    let orchestrator = ChatOrchestrator::new(
        config.chat.clone(),
        SqlGenerator::new(Arc::clone(&client), prompt.clone()),
        Box::new(KeywordValidator::new(config.safety.clone())),
        warehouse,
        Summarizer::new(client, prompt),
    );

    // One-shot mode.
    if let Some(ref question) = args.question {
        let mut conversation = orchestrator.new_conversation();
        let text = session::answer(&orchestrator, &mut conversation, question).await;
        println!("{}", text);
        return Ok(());
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session::run(&orchestrator, stdin, &mut stdout).await?;

    Ok(())
}

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SqlChatError};

/// Top-level configuration for the sqlchat assistant.
///
/// Loaded from `~/.sqlchat/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlChatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
}

impl SqlChatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SqlChatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SqlChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Generative model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Cloud project hosting the model.
    pub project: String,
    /// Region of the model endpoint.
    pub region: String,
    /// Publisher model name.
    pub model: String,
    /// Full endpoint URL. Overrides the URL derived from project/region/model.
    pub endpoint: Option<String>,
    /// Environment variable holding a pre-issued bearer token.
    pub access_token_env: String,
    /// Command printing a bearer token on stdout, used when the env var is unset.
    pub access_token_command: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a transient failure (transport error, 429, 5xx).
    pub max_retries: usize,
    /// Delay between retries in milliseconds.
    pub retry_delay_ms: u64,
}

impl ModelConfig {
    /// URL of the `generateContent` endpoint.
    pub fn endpoint_url(&self) -> String {
        if let Some(ref endpoint) = self.endpoint {
            return endpoint.clone();
        }
        format!(
            "https://{region}-aiplatform.googleapis.com/v1/projects/{project}/locations/{region}/publishers/google/models/{model}:generateContent",
            region = self.region,
            project = self.project,
            model = self.model,
        )
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            project: "light-moon-455005-g5".to_string(),
            region: "us-central1".to_string(),
            model: "gemini-2.0-flash".to_string(),
            endpoint: None,
            access_token_env: "SQLCHAT_ACCESS_TOKEN".to_string(),
            access_token_command: None,
            timeout_secs: 60,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

/// Which warehouse executes validated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarehouseBackend {
    /// BigQuery REST API.
    Bigquery,
    /// Local SQLite database file.
    Sqlite,
}

impl WarehouseBackend {
    /// Engine name as it appears in prompts.
    pub fn engine_name(&self) -> &'static str {
        match self {
            WarehouseBackend::Bigquery => "BigQuery",
            WarehouseBackend::Sqlite => "SQLite",
        }
    }
}

/// Warehouse configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub backend: WarehouseBackend,
    /// BigQuery project that owns the dataset.
    pub project: String,
    pub dataset: String,
    pub table: String,
    /// BigQuery job location.
    pub location: String,
    /// SQLite database file, used by the `sqlite` backend.
    pub sqlite_path: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl WarehouseConfig {
    /// Table reference as it should appear in generated SQL.
    ///
    /// BigQuery needs the fully qualified, backtick-quoted name; SQLite uses
    /// the bare table name.
    pub fn table_reference(&self) -> String {
        match self.backend {
            WarehouseBackend::Bigquery => {
                format!("`{}.{}.{}`", self.project, self.dataset, self.table)
            }
            WarehouseBackend::Sqlite => self.table.clone(),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            backend: WarehouseBackend::Bigquery,
            project: "light-moon-455005-g5".to_string(),
            dataset: "shopping".to_string(),
            table: "shopping".to_string(),
            location: "US".to_string(),
            sqlite_path: "shopping.db".to_string(),
            timeout_secs: 60,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of recent messages kept as model context.
    pub max_history: usize,
    /// Maximum question length in characters.
    pub max_message_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: 6,
            max_message_length: 2000,
        }
    }
}

/// Prompt construction settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// JSON schema descriptor replacing the built-in shopping schema.
    pub schema_path: Option<String>,
}

/// Query safety configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// A query must start with one of these (after trim + lowercase).
    pub allowed_prefixes: Vec<String>,
    /// A query containing any of these substrings is rejected.
    pub forbidden_keywords: Vec<String>,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            allowed_prefixes: vec!["select".to_string(), "with".to_string()],
            forbidden_keywords: [
                "insert", "update", "delete", "drop", "alter", "truncate", "create", "replace",
                "merge", "grant",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

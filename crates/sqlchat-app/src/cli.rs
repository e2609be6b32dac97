//! CLI argument definitions for the sqlchat binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use sqlchat_core::config::{SqlChatConfig, WarehouseBackend};
use sqlchat_core::SqlChatError;

/// sqlchat: ask questions about a warehouse table in plain English.
#[derive(Parser, Debug, Default)]
#[command(name = "sqlchat", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Warehouse backend to execute queries on.
    #[arg(short = 'b', long = "backend", value_enum)]
    pub backend: Option<BackendArg>,

    /// SQLite database file used by the sqlite backend.
    #[arg(long = "sqlite-path")]
    pub sqlite_path: Option<PathBuf>,

    /// Schema descriptor JSON file.
    #[arg(short = 's', long = "schema")]
    pub schema: Option<PathBuf>,

    /// Answer a single question and exit instead of starting a session.
    #[arg(short = 'q', long = "question")]
    pub question: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendArg {
    Bigquery,
    Sqlite,
}

impl From<BackendArg> for WarehouseBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Bigquery => WarehouseBackend::Bigquery,
            BackendArg::Sqlite => WarehouseBackend::Sqlite,
        }
    }
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SQLCHAT_CONFIG env var > ~/.sqlchat/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.explicit_config_path()
            .unwrap_or_else(default_config_path)
    }

    /// Config path named by the user, if any.
    fn explicit_config_path(&self) -> Option<PathBuf> {
        if let Some(ref p) = self.config {
            return Some(p.clone());
        }
        std::env::var("SQLCHAT_CONFIG").ok().map(PathBuf::from)
    }

    /// Load the configuration and apply flag overrides.
    ///
    /// A config file the user named explicitly must load; the default
    /// location falls back to built-in defaults.
    pub fn load_config(&self) -> Result<SqlChatConfig, SqlChatError> {
        let mut config = match self.explicit_config_path() {
            Some(path) => SqlChatConfig::load(&path).map_err(|e| {
                SqlChatError::Config(format!("{}: {}", path.display(), e))
            })?,
            None => SqlChatConfig::load_or_default(&default_config_path()),
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Apply flags that override config file values.
    pub fn apply_overrides(&self, config: &mut SqlChatConfig) {
        if let Some(backend) = self.backend {
            config.warehouse.backend = backend.into();
        }
        if let Some(ref path) = self.sqlite_path {
            config.warehouse.sqlite_path = path.to_string_lossy().to_string();
        }
        if let Some(ref path) = self.schema {
            config.prompt.schema_path = Some(path.to_string_lossy().to_string());
        }
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > SQLCHAT_LOG env var > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(level) = std::env::var("SQLCHAT_LOG") {
            if !level.trim().is_empty() {
                return level;
            }
        }
        config_level.to_string()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".sqlchat").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".sqlchat").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let args = CliArgs::parse_from([
            "sqlchat",
            "--backend",
            "sqlite",
            "--sqlite-path",
            "/tmp/shop.db",
            "-q",
            "How many customers?",
        ]);
        assert_eq!(args.backend, Some(BackendArg::Sqlite));
        assert_eq!(args.question.as_deref(), Some("How many customers?"));
    }

    #[test]
    fn test_config_flag_wins() {
        let args = CliArgs {
            config: Some(PathBuf::from("/etc/sqlchat.toml")),
            ..CliArgs::default()
        };
        assert_eq!(args.resolve_config_path(), PathBuf::from("/etc/sqlchat.toml"));
    }

    #[test]
    fn test_overrides_applied() {
        let args = CliArgs {
            backend: Some(BackendArg::Sqlite),
            sqlite_path: Some(PathBuf::from("data/shop.db")),
            schema: Some(PathBuf::from("schema.json")),
            ..CliArgs::default()
        };
        let mut config = SqlChatConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.warehouse.backend, WarehouseBackend::Sqlite);
        assert_eq!(config.warehouse.sqlite_path, "data/shop.db");
        assert_eq!(config.prompt.schema_path.as_deref(), Some("schema.json"));
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = SqlChatConfig::default();
        CliArgs::default().apply_overrides(&mut config);
        assert_eq!(config.warehouse.backend, WarehouseBackend::Bigquery);
        assert!(config.prompt.schema_path.is_none());
    }

    #[test]
    fn test_log_level_flag_wins() {
        let args = CliArgs {
            log_level: Some("debug".to_string()),
            ..CliArgs::default()
        };
        assert_eq!(args.resolve_log_level("warn"), "debug");
    }

    #[test]
    fn test_explicit_config_loaded_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[chat]\nmax_history = 4\n").unwrap();

        let args = CliArgs {
            config: Some(path),
            backend: Some(BackendArg::Sqlite),
            ..CliArgs::default()
        };
        let config = args.load_config().unwrap();
        assert_eq!(config.chat.max_history, 4);
        assert_eq!(config.warehouse.backend, WarehouseBackend::Sqlite);
    }

    #[test]
    fn test_explicit_config_missing_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs {
            config: Some(dir.path().join("absent.toml")),
            ..CliArgs::default()
        };
        assert!(matches!(args.load_config(), Err(SqlChatError::Config(_))));
    }

    #[test]
    fn test_explicit_config_invalid_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[chat\nmax_history = ").unwrap();
        let args = CliArgs {
            config: Some(path),
            ..CliArgs::default()
        };
        assert!(args.load_config().is_err());
    }
}

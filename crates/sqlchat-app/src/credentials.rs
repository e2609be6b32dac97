//! Bearer token acquisition for the model and warehouse APIs.

use std::process::Command;

use sqlchat_core::config::ModelConfig;
use sqlchat_core::SqlChatError;

/// Find an access token.
///
/// Tries the configured environment variable first, then the configured
/// token command (e.g. `gcloud auth print-access-token`).
pub fn resolve_access_token(config: &ModelConfig) -> Result<String, SqlChatError> {
    if let Ok(token) = std::env::var(&config.access_token_env) {
        let token = token.trim();
        if !token.is_empty() {
            tracing::debug!(var = %config.access_token_env, "Access token read from environment");
            return Ok(token.to_string());
        }
    }

    match config.access_token_command {
        Some(ref command) => run_token_command(command),
        None => Err(SqlChatError::Credentials(format!(
            "set {} or configure model.access_token_command",
            config.access_token_env
        ))),
    }
}

fn run_token_command(command: &str) -> Result<String, SqlChatError> {
    #[cfg(target_os = "windows")]
    let output = Command::new("cmd").args(["/C", command]).output();
    #[cfg(not(target_os = "windows"))]
    let output = Command::new("sh").args(["-c", command]).output();

    let output = output
        .map_err(|e| SqlChatError::Credentials(format!("failed to run `{}`: {}", command, e)))?;
    if !output.status.success() {
        return Err(SqlChatError::Credentials(format!(
            "`{}` exited with {}: {}",
            command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(SqlChatError::Credentials(format!(
            "`{}` printed no token",
            command
        )));
    }
    tracing::debug!("Access token obtained from command");
    Ok(token)
}

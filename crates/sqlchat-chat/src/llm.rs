//! Generative model client.
//!
//! [`CompletionClient`] is the seam between prompt construction and the
//! model service. [`VertexClient`] implements it against the Vertex AI
//! `generateContent` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sqlchat_core::config::ModelConfig;
use sqlchat_core::RetryPolicy;

use crate::error::ChatError;

// =============================================================================
// Request content
// =============================================================================

/// Author of a content block sent to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentRole {
    User,
    Model,
}

/// A text part of a content block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A role-tagged content block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub role: ContentRole,
    pub parts: Vec<Part>,
}

impl Content {
    /// A content block with a single text part.
    pub fn text(role: ContentRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Sends prompts to a generative model and returns the first candidate's text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, contents: &[Content]) -> Result<String, ChatError>;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: &'a [Content],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> Result<String, ChatError> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ChatError::MalformedResponse("no candidate text in response".to_string()))
    }
}

// =============================================================================
// VertexClient
// =============================================================================

/// Vertex AI `generateContent` client authenticated with a bearer token.
pub struct VertexClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    retry: RetryPolicy,
}

impl VertexClient {
    /// Create a client for the endpoint described by `config`.
    pub fn new(config: &ModelConfig, token: impl Into<String>) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint_url(),
            token: token.into(),
            retry: RetryPolicy::new(
                config.max_retries,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn complete_once(&self, contents: &[Content]) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&GenerateRequest { contents })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Model request failed");
            return Err(ChatError::Generation {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;
        body.into_text()
    }
}

#[async_trait]
impl CompletionClient for VertexClient {
    async fn complete(&self, contents: &[Content]) -> Result<String, ChatError> {
        let text = self
            .retry
            .retry_if(|| self.complete_once(contents), ChatError::is_transient)
            .await?;
        debug!(chars = text.len(), "Model completion received");
        Ok(text)
    }
}

//! Safety gate for generated SQL.
//!
//! Decides whether a candidate query produced by the language model may be
//! sent to the warehouse. The default [`KeywordValidator`] is a syntactic
//! allow-list/deny-list check, not a SQL parser:
//!
//! - a forbidden keyword inside a string literal or comment still rejects the
//!   query;
//! - detection is substring-based, so an identifier such as `updated_at` is
//!   rejected because it contains `update`.
//!
//! Callers depend on the [`QueryValidator`] trait so a parser-based validator
//! can replace it without changing the turn pipeline.

use crate::config::SafetyConfig;

/// Decision made by a validator about a candidate query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyDecision {
    /// The query is read-only and may be executed.
    Allow,
    /// The query must not be executed.
    Deny { reason: String },
}

impl SafetyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, SafetyDecision::Allow)
    }
}

/// A gate that inspects candidate SQL before execution.
pub trait QueryValidator: Send + Sync {
    /// Check a query and explain the decision.
    fn check(&self, query: &str) -> SafetyDecision;

    /// `true` if the query may be executed.
    fn is_safe(&self, query: &str) -> bool {
        self.check(query).is_allowed()
    }
}

/// Prefix allow-list plus keyword deny-list validator.
pub struct KeywordValidator {
    config: SafetyConfig,
}

impl KeywordValidator {
    /// Create a validator with the given allow/deny lists.
    ///
    /// List entries are compared against the lowercased query, so they are
    /// lowercased here once.
    pub fn new(config: SafetyConfig) -> Self {
        let config = SafetyConfig {
            allowed_prefixes: config
                .allowed_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            forbidden_keywords: config
                .forbidden_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
        };
        Self { config }
    }
}

impl Default for KeywordValidator {
    fn default() -> Self {
        Self::new(SafetyConfig::default())
    }
}

impl QueryValidator for KeywordValidator {
    fn check(&self, query: &str) -> SafetyDecision {
        let normalized = query.trim().to_lowercase();

        if normalized.is_empty() {
            return SafetyDecision::Deny {
                reason: "Query is empty".to_string(),
            };
        }

        let allowed_prefix = self
            .config
            .allowed_prefixes
            .iter()
            .any(|prefix| normalized.starts_with(prefix.as_str()));
        if !allowed_prefix {
            return SafetyDecision::Deny {
                reason: format!(
                    "Query must start with one of: {}",
                    self.config.allowed_prefixes.join(", ")
                ),
            };
        }

        if let Some(keyword) = self
            .config
            .forbidden_keywords
            .iter()
            .find(|keyword| normalized.contains(keyword.as_str()))
        {
            return SafetyDecision::Deny {
                reason: format!("Query contains forbidden keyword '{}'", keyword),
            };
        }

        SafetyDecision::Allow
    }
}

/// Check a query against the default allow/deny lists.
pub fn is_safe(query: &str) -> bool {
    KeywordValidator::default().is_safe(query)
}

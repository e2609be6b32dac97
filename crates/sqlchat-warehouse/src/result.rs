//! Query result sets.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single result row keyed by column name.
pub type Row = Map<String, Value>;

/// Rows returned by a warehouse, with the column order reported by the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as a compact JSON array of objects.
    ///
    /// This is the form shown to the model and stored in conversation context.
    pub fn to_json(&self) -> String {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect()).to_string()
    }

    /// Rows as an indented JSON array, for terminal output.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.rows).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json())
    }
}

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

// =============================================================================
// Conversation messages
// =============================================================================

/// Author of a conversation message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message in the conversation history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// =============================================================================
// Schema descriptor
// =============================================================================

/// One column of the queried table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub description: String,
}

impl ColumnSpec {
    fn new(name: &str, column_type: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: column_type.to_string(),
            description: description.to_string(),
        }
    }
}

/// Static description of the queried table, embedded in every SQL prompt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub table: String,
    pub columns: Vec<ColumnSpec>,
}

impl SchemaDescriptor {
    /// Load a schema descriptor from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let schema: SchemaDescriptor = serde_json::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            table = %schema.table,
            columns = schema.columns.len(),
            "Schema descriptor loaded"
        );
        Ok(schema)
    }

    /// Pretty-printed JSON, as embedded in prompts.
    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The built-in `shopping` table schema.
    ///
    /// Column names are kept verbatim, including the trailing space in
    /// `Purchase Amount `, since generated SQL must quote them exactly.
    pub fn shopping() -> Self {
        Self {
            table: "shopping".to_string(),
            columns: vec![
                ColumnSpec::new("Customer ID", "INTEGER", "Unique ID for customer"),
                ColumnSpec::new("Age", "INTEGER", "Customer's age"),
                ColumnSpec::new("Gender", "STRING", "Gender of the customer"),
                ColumnSpec::new("Item Purchased", "STRING", "Name of the product purchased"),
                ColumnSpec::new("Category", "STRING", "Category of the item"),
                ColumnSpec::new("Purchase Amount ", "INTEGER", "Amount spent on the purchase"),
                ColumnSpec::new("Location", "STRING", "Location of the purchase"),
                ColumnSpec::new("Size", "STRING", "Size of the purchased item"),
                ColumnSpec::new("Color", "STRING", "Color of the purchased item"),
                ColumnSpec::new(
                    "Season",
                    "STRING",
                    "Season during which the item was purchased",
                ),
                ColumnSpec::new("Review Rating", "FLOAT", "Customer rating for the product"),
                ColumnSpec::new(
                    "Subscription Status",
                    "BOOLEAN",
                    "Whether the customer is subscribed or not. TRUE/FALSE",
                ),
                ColumnSpec::new("Payment Method", "STRING", "Method used for payment"),
                ColumnSpec::new("Shipping Type", "STRING", "Type of delivery used"),
                ColumnSpec::new(
                    "Discount Applied",
                    "STRING",
                    "Whether a discount was applied to the purchase",
                ),
                ColumnSpec::new("Promo Code Used", "STRING", "Whether a promo code was used"),
                ColumnSpec::new(
                    "Previous Purchases",
                    "INTEGER",
                    "Total previous purchases made by the customer",
                ),
                ColumnSpec::new(
                    "Preferred Payment Method",
                    "STRING",
                    "Customer's preferred method of payment",
                ),
                ColumnSpec::new(
                    "Frequency of Purchases",
                    "STRING",
                    "How often the customer makes a purchase",
                ),
            ],
        }
    }
}

// =============================================================================
// Worked examples
// =============================================================================

/// A worked question/SQL pair shown to the model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleQuery {
    pub question: String,
    pub sql: String,
}

impl ExampleQuery {
    pub fn new(question: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            sql: sql.into(),
        }
    }

    /// The default shopping examples, with `table_ref` as the FROM target.
    pub fn shopping_defaults(table_ref: &str) -> Vec<Self> {
        vec![
            Self::new(
                "What's the average amount spent by subscribed users?",
                format!(
                    "SELECT AVG(`Purchase Amount `) AS avg_spent\nFROM {table_ref}\nWHERE `Subscription Status` = TRUE;"
                ),
            ),
            Self::new(
                "Show all winter clothing items rated above 4.",
                format!(
                    "SELECT * FROM {table_ref}\nWHERE Category = 'Clothing' AND Season = 'Winter' AND `Review Rating` > 4;"
                ),
            ),
            Self::new(
                "Locations with highest avg spend?",
                format!(
                    "SELECT Location, AVG(`Purchase Amount `) AS avg_amt\nFROM {table_ref}\nGROUP BY Location\nORDER BY avg_amt DESC;"
                ),
            ),
        ]
    }
}

//! Warehouse execution for validated queries.
//!
//! Provides the [`Warehouse`] trait, a BigQuery REST client for the hosted
//! dataset, and a SQLite warehouse for running against a local copy.

pub mod bigquery;
pub mod error;
pub mod result;
pub mod sqlite;

use async_trait::async_trait;

pub use bigquery::BigQueryWarehouse;
pub use error::WarehouseError;
pub use result::QueryResult;
pub use sqlite::SqliteWarehouse;

/// Executes read-only SQL and returns rows as column-name → value maps.
///
/// Callers are expected to pass only queries that already cleared the
/// safety gate; implementations do not validate SQL themselves.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run `sql` and collect the full result set.
    async fn execute(&self, sql: &str) -> Result<QueryResult, WarehouseError>;
}

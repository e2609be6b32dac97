//! SQLite-backed warehouse.
//!
//! Wraps a single rusqlite Connection in a Mutex. Useful for running the
//! assistant against a local copy of the dataset.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::{Number, Value};
use tracing::{debug, info};

use crate::error::WarehouseError;
use crate::result::{QueryResult, Row};
use crate::Warehouse;

/// Local SQLite database exposed through the [`Warehouse`] trait.
pub struct SqliteWarehouse {
    conn: Mutex<Connection>,
}

impl SqliteWarehouse {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, WarehouseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    WarehouseError::Sqlite(format!("Failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| WarehouseError::Sqlite(format!("Failed to open database: {}", e)))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        info!("SQLite warehouse opened at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, WarehouseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| WarehouseError::Sqlite(format!("Failed to open in-memory db: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a batch of statements, e.g. to create and load the dataset.
    ///
    /// This bypasses the safety gate and is meant for setup only.
    pub fn execute_batch(&self, sql: &str) -> Result<(), WarehouseError> {
        self.with_conn(|conn| Ok(conn.execute_batch(sql)?))
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, WarehouseError>
    where
        F: FnOnce(&Connection) -> Result<T, WarehouseError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| WarehouseError::Sqlite(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }

    fn query(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect();

            let mut rows = stmt.query([])?;
            let mut collected = Vec::new();
            while let Some(row) = rows.next()? {
                let mut map = Row::new();
                for (idx, name) in columns.iter().enumerate() {
                    map.insert(name.clone(), to_json(row.get_ref(idx)?));
                }
                collected.push(map);
            }

            Ok(QueryResult::new(columns, collected))
        })
    }
}

#[async_trait]
impl Warehouse for SqliteWarehouse {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> Result<QueryResult, WarehouseError> {
        let result = self.query(sql)?;
        debug!(rows = result.len(), "SQLite query executed");
        Ok(result)
    }
}

impl std::fmt::Debug for SqliteWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteWarehouse").finish()
    }
}

/// Map a SQLite value to JSON by storage class.
fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<{} bytes>", bytes.len())),
    }
}

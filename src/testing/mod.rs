//! In-memory stand-ins for the storage layer, used by unit and HTTP tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::database::{ColumnManifest, DatabaseError, QueryExecutor, Row};
use crate::filter::SqlResult;

/// Answers every statement on a table with that table's canned rows and
/// records each statement it receives.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    tables: HashMap<String, Vec<Row>>,
    failing: bool,
    statements: Mutex<Vec<SqlResult>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor whose every call fails like a lost connection.
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }

    pub fn statements(&self) -> Vec<SqlResult> {
        self.statements.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn rows_for(&self, query: &str) -> Vec<Row> {
        self.tables
            .iter()
            .find(|(table, _)| query.contains(&format!("FROM \"{}\" ", table)))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryExecutor for MemoryExecutor {
    async fn fetch(&self, query: &SqlResult, manifest: &ColumnManifest, limit: usize) -> Result<Vec<Row>, DatabaseError> {
        if let Ok(mut statements) = self.statements.lock() {
            statements.push(query.clone());
        }
        if self.failing {
            return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(self
            .rows_for(&query.query)
            .into_iter()
            .take(limit)
            .map(|row| row.into_iter().filter(|(name, _)| manifest.field_type(name).is_some()).collect())
            .collect())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        if self.failing {
            Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row<V: Into<Value>>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> Row {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v.into())).collect()
}

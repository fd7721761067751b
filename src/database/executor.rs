use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use serde_json::{Map, Number, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::types::BigDecimal;
use sqlx::{Column, PgPool, Row as _, ValueRef};

use crate::config;
use crate::filter::{FilterValue, SqlResult};

use super::manager::DatabaseError;

/// One result row, keyed by output column name.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Float,
}

/// Output columns of a query and how each one is decoded. Columns the
/// manifest does not name are dropped from the row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnManifest {
    fields: Vec<(&'static str, FieldType)>,
}

impl ColumnManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strings(self, names: &[&'static str]) -> Self {
        self.with(names, FieldType::String)
    }

    pub fn integers(self, names: &[&'static str]) -> Self {
        self.with(names, FieldType::Integer)
    }

    pub fn floats(self, names: &[&'static str]) -> Self {
        self.with(names, FieldType::Float)
    }

    fn with(mut self, names: &[&'static str], field_type: FieldType) -> Self {
        for &name in names {
            self.fields.retain(|(existing, _)| *existing != name);
            self.fields.push((name, field_type));
        }
        self
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields.iter().find(|(field, _)| *field == name).map(|(_, t)| *t)
    }

    pub fn fields(&self) -> &[(&'static str, FieldType)] {
        &self.fields
    }
}

/// Runs compiled statements. Implementations stop after `limit` rows.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn fetch(&self, query: &SqlResult, manifest: &ColumnManifest, limit: usize)
        -> Result<Vec<Row>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn fetch(
        &self,
        query: &SqlResult,
        manifest: &ColumnManifest,
        limit: usize,
    ) -> Result<Vec<Row>, DatabaseError> {
        let started = Instant::now();
        if config::config().query.debug_logging {
            tracing::debug!("SQL: {} -- params: {:?}", query.query, query.params);
        }

        let mut q = sqlx::query(&query.query);
        for p in query.params.iter() {
            q = bind_param(q, p);
        }

        let mut rows = Vec::new();
        let mut stream = q.fetch(&self.pool);
        while rows.len() < limit {
            match stream.try_next().await? {
                Some(row) => rows.push(decode_row(&row, manifest)?),
                None => break,
            }
        }

        if config::config().database.enable_query_logging {
            tracing::info!("Fetched {} rows in {:?}", rows.len(), started.elapsed());
        }
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q FilterValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        FilterValue::Integer(i) => q.bind(*i),
        FilterValue::Text(s) => q.bind(s.as_str()),
        FilterValue::Date(d) => q.bind(*d),
    }
}

fn decode_row(row: &PgRow, manifest: &ColumnManifest) -> Result<Row, DatabaseError> {
    let mut map = Map::new();
    for (i, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let Some(field_type) = manifest.field_type(name) else {
            continue;
        };
        let value = if row.try_get_raw(i)?.is_null() {
            Value::Null
        } else {
            decode_value(row, i, name, field_type)?
        };
        map.insert(name.to_string(), value);
    }
    Ok(map)
}

fn decode_value(row: &PgRow, i: usize, name: &str, field_type: FieldType) -> Result<Value, DatabaseError> {
    let mismatch = |expected| DatabaseError::Decode { column: name.to_string(), expected };
    match field_type {
        FieldType::String => {
            if let Ok(s) = row.try_get::<String, _>(i) {
                Ok(Value::String(s))
            } else if let Ok(d) = row.try_get::<NaiveDate, _>(i) {
                Ok(Value::String(d.to_string()))
            } else {
                Err(mismatch("string"))
            }
        }
        FieldType::Integer => {
            if let Ok(v) = row.try_get::<i64, _>(i) {
                Ok(Value::Number(v.into()))
            } else if let Ok(v) = row.try_get::<i32, _>(i) {
                Ok(Value::Number(v.into()))
            } else if let Ok(v) = row.try_get::<i16, _>(i) {
                Ok(Value::Number(v.into()))
            } else if let Ok(v) = row.try_get::<BigDecimal, _>(i) {
                // sum() over bigint columns comes back as numeric
                v.to_string()
                    .parse::<i64>()
                    .map(|v| Value::Number(v.into()))
                    .map_err(|_| mismatch("integer"))
            } else {
                Err(mismatch("integer"))
            }
        }
        FieldType::Float => {
            let v = if let Ok(v) = row.try_get::<f64, _>(i) {
                v
            } else if let Ok(v) = row.try_get::<f32, _>(i) {
                v as f64
            } else if let Ok(v) = row.try_get::<BigDecimal, _>(i) {
                v.to_string().parse::<f64>().map_err(|_| mismatch("float"))?
            } else {
                return Err(mismatch("float"));
            };
            Ok(Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_keeps_declaration_order_and_last_type() {
        let manifest = ColumnManifest::new()
            .strings(&["location", "epiweek"])
            .integers(&["epiweek", "num"])
            .floats(&["percent"]);
        assert_eq!(
            manifest.fields(),
            &[
                ("location", FieldType::String),
                ("epiweek", FieldType::Integer),
                ("num", FieldType::Integer),
                ("percent", FieldType::Float),
            ]
        );
        assert_eq!(manifest.field_type("num"), Some(FieldType::Integer));
        assert_eq!(manifest.field_type("state"), None);
    }
}

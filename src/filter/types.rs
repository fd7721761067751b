use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::FilterError;

/// Value domain of a filter list. Epiweeks (YYYYWW) and issues are integers;
/// dates are calendar dates encoded on the wire as YYYYMMDD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Integer,
    String,
    Date,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Integer => write!(f, "integer"),
            FilterKind::String => write!(f, "string"),
            FilterKind::Date => write!(f, "date"),
        }
    }
}

/// A single bound value. Also the parameter type handed to the executor,
/// so every value that reaches SQL goes through parameter binding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterValue {
    Integer(i64),
    Text(String),
    Date(NaiveDate),
}

impl FilterValue {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValue::Integer(_) => FilterKind::Integer,
            FilterValue::Text(_) => FilterKind::String,
            FilterValue::Date(_) => FilterKind::Date,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        FilterValue::Text(value.into())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Integer(v) => write!(f, "{}", v),
            FilterValue::Text(v) => write!(f, "{}", v),
            FilterValue::Date(v) => write!(f, "{}", v.format("%Y%m%d")),
        }
    }
}

/// A scalar or a closed range `[low, high]` of one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    Scalar(FilterValue),
    Range(FilterValue, FilterValue),
}

impl FilterSpec {
    pub fn kind(&self) -> Result<FilterKind, FilterError> {
        match self {
            FilterSpec::Scalar(v) => Ok(v.kind()),
            FilterSpec::Range(low, high) => {
                if low.kind() != high.kind() {
                    return Err(FilterError::KindMismatch { expected: low.kind(), found: high.kind() });
                }
                Ok(low.kind())
            }
        }
    }

    /// Inclusive membership; a reversed range contains nothing, as with SQL BETWEEN.
    pub fn contains(&self, value: &FilterValue) -> bool {
        match self {
            FilterSpec::Scalar(v) => v == value,
            FilterSpec::Range(low, high) => low <= value && value <= high,
        }
    }
}

/// Ordered, non-empty list of specs sharing one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterList {
    kind: FilterKind,
    specs: Vec<FilterSpec>,
}

impl FilterList {
    pub fn new(kind: FilterKind, specs: Vec<FilterSpec>) -> Result<Self, FilterError> {
        if specs.is_empty() {
            return Err(FilterError::EmptyFilter);
        }
        for spec in &specs {
            let found = spec.kind()?;
            if found != kind {
                return Err(FilterError::KindMismatch { expected: kind, found });
            }
        }
        Ok(Self { kind, specs })
    }

    pub fn integers(values: impl IntoIterator<Item = i64>) -> Result<Self, FilterError> {
        let specs = values.into_iter().map(|v| FilterSpec::Scalar(FilterValue::Integer(v))).collect();
        Self::new(FilterKind::Integer, specs)
    }

    pub fn strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Result<Self, FilterError> {
        let specs = values.into_iter().map(|v| FilterSpec::Scalar(FilterValue::Text(v.into()))).collect();
        Self::new(FilterKind::String, specs)
    }

    pub fn integer_range(low: i64, high: i64) -> Result<Self, FilterError> {
        Self::new(
            FilterKind::Integer,
            vec![FilterSpec::Range(FilterValue::Integer(low), FilterValue::Integer(high))],
        )
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn specs(&self) -> &[FilterSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn contains(&self, value: &FilterValue) -> bool {
        self.specs.iter().any(|spec| spec.contains(value))
    }

    /// Scalar string values, in order. Ranges are skipped.
    pub fn scalar_strings(&self) -> Vec<&str> {
        self.specs
            .iter()
            .filter_map(|spec| match spec {
                FilterSpec::Scalar(FilterValue::Text(s)) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A column identifier. Identifiers are compile-time constants from the
/// source catalog; request data only ever reaches SQL as bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<&'static str>,
    pub name: &'static str,
}

impl ColumnRef {
    pub const fn new(name: &'static str) -> Self {
        Self { table: None, name }
    }

    pub const fn qualified(table: &'static str, name: &'static str) -> Self {
        Self { table: Some(table), name }
    }

    pub fn to_sql(&self) -> String {
        match self.table {
            Some(table) => format!("{}.\"{}\"", table, self.name),
            None => format!("\"{}\"", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
        }
    }
}

/// Results are only ever returned in ascending key order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterOrderInfo {
    pub column: ColumnRef,
    pub sort: SortDirection,
}

impl FilterOrderInfo {
    pub const fn asc(column: ColumnRef) -> Self {
        Self { column, sort: SortDirection::Asc }
    }
}

/// Rendered statement: SQL text with `$n` placeholders and the values to bind, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}

use chrono::NaiveDate;

use super::error::FilterError;
use super::types::{FilterKind, FilterList, FilterSpec, FilterValue};

/// Parse a comma-separated parameter such as `201501-201510,201520` into a
/// filter list. Integer and date lists accept `low-high` ranges; string lists
/// take every item verbatim.
pub fn extract_values(raw: &str, kind: FilterKind) -> Result<FilterList, FilterError> {
    let mut specs = Vec::new();
    for item in raw.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let spec = match kind {
            FilterKind::String => FilterSpec::Scalar(FilterValue::text(item)),
            FilterKind::Integer | FilterKind::Date => match item.split_once('-') {
                Some((low, high)) => FilterSpec::Range(parse_value(low, kind)?, parse_value(high, kind)?),
                None => FilterSpec::Scalar(parse_value(item, kind)?),
            },
        };
        specs.push(spec);
    }
    FilterList::new(kind, specs)
}

pub fn parse_value(raw: &str, kind: FilterKind) -> Result<FilterValue, FilterError> {
    let raw = raw.trim();
    let invalid = || FilterError::InvalidValue { kind, value: raw.to_string() };
    match kind {
        FilterKind::Integer => {
            if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            raw.parse::<i64>().map(FilterValue::Integer).map_err(|_| invalid())
        }
        FilterKind::Date => {
            if raw.len() != 8 || !raw.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid());
            }
            NaiveDate::parse_from_str(raw, "%Y%m%d").map(FilterValue::Date).map_err(|_| invalid())
        }
        FilterKind::String => {
            if raw.is_empty() {
                return Err(invalid());
            }
            Ok(FilterValue::text(raw))
        }
    }
}

/// Parse a single signed integer parameter such as `lag`.
pub fn parse_integer(raw: &str) -> Result<i64, FilterError> {
    let raw = raw.trim();
    raw.parse::<i64>().map_err(|_| FilterError::InvalidValue { kind: FilterKind::Integer, value: raw.to_string() })
}

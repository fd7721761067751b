//! Issue resolution for time-versioned tables.
//!
//! Every row of a versioned table is one revision (`issue`) of a logical
//! observation identified by the table's key fields. A request picks which
//! revisions come back: explicit issues, a fixed reporting lag, or the most
//! recent issue per observation.

pub mod error;
pub mod overlay;

pub use error::IssueError;
pub use overlay::{overlay_scopes, Access, TableScope};

use crate::filter::{
    compile, ColumnRef, Filter, FilterKind, FilterList, FilterOrderInfo, FilterValue, Predicate, SelectExpr,
    SelectField, TableSource,
};

/// Alias of the aggregated max-issue subquery in `Latest` plans.
const LATEST_ALIAS: &str = "x";
const MAX_ISSUE: &str = "max_issue";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IssueSelector {
    Explicit(FilterList),
    Lag(i64),
    #[default]
    Latest,
}

impl IssueSelector {
    /// Explicit issues win over a lag when a caller supplies both.
    pub fn from_request(issues: Option<FilterList>, lag: Option<i64>) -> Result<Self, IssueError> {
        match (issues, lag) {
            (Some(issues), _) => {
                if issues.kind() != FilterKind::Integer {
                    return Err(IssueError::InvalidSelector(format!(
                        "issues must be integer epiweeks, got {} values",
                        issues.kind()
                    )));
                }
                Ok(IssueSelector::Explicit(issues))
            }
            (None, Some(lag)) if lag < 0 => {
                Err(IssueError::InvalidSelector(format!("lag must be non-negative, got {}", lag)))
            }
            (None, Some(lag)) => Ok(IssueSelector::Lag(lag)),
            (None, None) => Ok(IssueSelector::Latest),
        }
    }
}

/// Shape of a versioned table: which columns form the observation key and
/// which carry the issue and its lag (issue minus epiweek, in weeks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionedTable {
    pub name: &'static str,
    pub alias: &'static str,
    pub key_fields: &'static [&'static str],
    pub issue_field: &'static str,
    pub lag_field: &'static str,
}

impl VersionedTable {
    pub fn column(&self, name: &'static str) -> ColumnRef {
        ColumnRef::qualified(self.alias, name)
    }

    fn issue(&self) -> ColumnRef {
        self.column(self.issue_field)
    }

    fn keys(&self) -> Vec<ColumnRef> {
        self.key_fields.iter().map(|k| self.column(*k)).collect()
    }

    /// Observation key ascending, then issue ascending.
    pub fn default_order(&self) -> Vec<FilterOrderInfo> {
        self.keys()
            .into_iter()
            .chain(std::iter::once(self.issue()))
            .map(FilterOrderInfo::asc)
            .collect()
    }
}

/// Build the final query for `table` restricted by `base`.
///
/// `Latest` joins the table against `max(issue)` grouped by the key fields;
/// issue values are unique per key in the store, so each key yields one row.
pub fn resolve(
    table: &VersionedTable,
    fields: Vec<SelectField>,
    base: Predicate,
    selector: &IssueSelector,
) -> Result<Filter, IssueError> {
    let filter = Filter::new(table.name, table.alias)
        .select(fields)
        .order(table.default_order());

    let filter = match selector {
        IssueSelector::Explicit(issues) => {
            let condition_issue = compile(table.issue(), issues, FilterKind::Integer)?;
            filter.where_clause(Predicate::and([base, condition_issue]))
        }
        IssueSelector::Lag(lag) => {
            let condition_lag = Predicate::eq(table.column(table.lag_field), FilterValue::Integer(*lag));
            filter.where_clause(Predicate::and([base, condition_lag]))
        }
        IssueSelector::Latest => {
            let mut subquery_fields = vec![SelectField::aliased(SelectExpr::Max(table.issue()), MAX_ISSUE)];
            subquery_fields.extend(table.keys().into_iter().map(SelectField::column));
            let subquery = Filter::new(table.name, table.alias)
                .select(subquery_fields)
                .where_clause(base)
                .group_by(table.keys());

            let mut on = vec![Predicate::columns_eq(ColumnRef::qualified(LATEST_ALIAS, MAX_ISSUE), table.issue())];
            for &key in table.key_fields {
                on.push(Predicate::columns_eq(ColumnRef::qualified(LATEST_ALIAS, key), table.column(key)));
            }
            filter.join(
                TableSource::Subquery { filter: Box::new(subquery), alias: LATEST_ALIAS },
                Predicate::and(on),
            )
        }
    };
    Ok(filter)
}
